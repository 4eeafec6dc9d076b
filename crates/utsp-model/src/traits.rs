// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser and model entry points

use crate::{EntityResolver, ModelMetadata, PropertyReader, Result};
use std::sync::Arc;

/// Receives `(phase, percent)` while a file is loaded
pub type ProgressCallback = Box<dyn Fn(&str, f32) + Send>;

/// Something that turns IFC text into a model
///
/// ```ignore
/// let parser: Box<dyn IfcParser> = Box::new(utsp_parser::StepParser::new());
/// let model = parser.parse(&content)?;
/// assert!(!model.metadata().schema_version.is_empty());
/// ```
pub trait IfcParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>>;

    fn parse_with_progress(
        &self,
        content: &str,
        on_progress: ProgressCallback,
    ) -> Result<Arc<dyn IfcModel>>;
}

/// A loaded IFC file, read-only
///
/// `Send + Sync` so a model can move into a blocking task of the upload server.
pub trait IfcModel: Send + Sync {
    fn resolver(&self) -> &dyn EntityResolver;

    /// Property sets by element
    fn properties(&self) -> &dyn PropertyReader;

    /// Header fields
    fn metadata(&self) -> &ModelMetadata;
}
