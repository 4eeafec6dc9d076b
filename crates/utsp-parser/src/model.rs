// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ParsedModel - Main IFC model implementation

use crate::properties::PropertyReaderImpl;
use crate::resolver::ResolverImpl;
use crate::scanner::{parse_header, EntityIndex, EntityScanner, HeaderInfo};

use log::{debug, info, warn};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use utsp_model::{
    EntityResolver, IfcModel, ModelMetadata, ParseError, ProgressCallback, PropertyReader, Result,
};

/// Parsed IFC model implementing the `IfcModel` trait
///
/// Keeps the original source text so the annotated export can append to it.
pub struct ParsedModel {
    /// Entity resolver for lookups
    resolver: Arc<ResolverImpl>,
    /// Property reader
    properties: Arc<PropertyReaderImpl>,
    /// File metadata
    metadata: ModelMetadata,
    /// File bytes, kept only when they are not valid UTF-8
    raw: Option<Vec<u8>>,
}

impl ParsedModel {
    /// Parse IFC content and create a model
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_with_progress(content, Box::new(|_, _| {}))
    }

    /// Parse with progress reporting
    pub fn parse_with_progress(content: &str, on_progress: ProgressCallback) -> Result<Self> {
        if !content.trim_start().starts_with("ISO-10303-21") {
            return Err(ParseError::format("missing ISO-10303-21 signature"));
        }
        if !content.contains("DATA;") {
            return Err(ParseError::format("missing DATA section"));
        }

        on_progress("Scanning entities", 0.0);
        let index: EntityIndex = EntityScanner::build_index(content);
        debug!(
            "Indexed {} instances ({} types, max id #{})",
            index.len(),
            index.by_type.len(),
            index.max_id
        );
        on_progress("Building index", 40.0);

        let resolver = Arc::new(ResolverImpl::new(content.to_string(), index));

        on_progress("Building property index", 60.0);
        let properties = Arc::new(PropertyReaderImpl::new(resolver.clone()));

        on_progress("Processing metadata", 90.0);
        let metadata = metadata_from_header(parse_header(content));

        on_progress("Complete", 100.0);

        Ok(Self {
            resolver,
            properties,
            metadata,
            raw: None,
        })
    }

    /// Parse raw file bytes
    ///
    /// Invalid UTF-8 is replaced for parsing rather than rejected; STEP files
    /// are ASCII but some exporters leak Latin-1 bytes into strings. The
    /// original bytes are then kept so exports reproduce them unchanged.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let content = String::from_utf8_lossy(&bytes);
        let lossy = matches!(content, Cow::Owned(_));
        let mut model = Self::parse(&content)?;
        if lossy {
            warn!("File is not valid UTF-8; invalid bytes are read as U+FFFD");
            model.raw = Some(bytes);
        }
        Ok(model)
    }

    /// Read and parse an IFC file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model = Self::from_bytes(std::fs::read(path)?)?;
        info!(
            "Loaded {} ({} instances, schema {})",
            path.display(),
            model.resolver.entity_count(),
            model.metadata.schema_version
        );
        Ok(model)
    }

    /// Original file content, as parsed
    pub fn source(&self) -> &str {
        self.resolver.content()
    }

    /// Undecoded file bytes, when they differ from [`source`](Self::source)
    pub fn raw_source(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Scanned instance index (max id, end of the DATA section)
    pub fn index(&self) -> &EntityIndex {
        self.resolver.index()
    }
}

fn metadata_from_header(header: HeaderInfo) -> ModelMetadata {
    ModelMetadata {
        schema_version: header.schema_version,
        originating_system: header.originating_system,
        preprocessor_version: header.preprocessor_version,
        file_name: header.file_name,
        author: header.author,
        organization: header.organization,
        timestamp: header.timestamp,
    }
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        self.resolver.as_ref()
    }

    fn properties(&self) -> &dyn PropertyReader {
        self.properties.as_ref()
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
