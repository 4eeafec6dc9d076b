// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Utsp Parser - STEP/IFC reader and writer
//!
//! This crate loads IFC (STEP) files for validation and implements the
//! traits defined in `utsp-model`.
//!
//! # Features
//!
//! - **Fast tokenization** using `nom` combinators
//! - **SIMD-accelerated scanning** using `memchr`
//! - **Lazy entity decoding** - only parse entities when needed
//! - **Append-only writing** - new instances are spliced into the DATA
//!   section without touching existing lines
//!
//! # Example
//!
//! ```ignore
//! use utsp_parser::ParsedModel;
//! use utsp_model::{IfcModel, IfcType};
//!
//! let model = ParsedModel::open("RIV_Hull.ifc")?;
//! let proxies = model.resolver().entities_by_type(&IfcType::IfcBuildingElementProxy);
//! println!("Found {} proxies", proxies.len());
//! ```

mod guid;
mod model;
mod properties;
mod resolver;
mod scanner;
mod tokenizer;
mod writer;

pub use guid::{compress_guid, new_global_id};
pub use model::ParsedModel;
pub use scanner::{EntityIndex, EntityScanner};
pub use tokenizer::{decode_step_string, parse_entity, Token};
pub use writer::{encode_attribute, encode_string, StepWriter};

use std::sync::Arc;
use utsp_model::{IfcModel, IfcParser, ProgressCallback, Result};

/// Main STEP/IFC parser implementing `IfcParser` trait
#[derive(Default)]
pub struct StepParser;

impl StepParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }
}

impl IfcParser for StepParser {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>> {
        ParsedModel::parse(content).map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }

    fn parse_with_progress(
        &self,
        content: &str,
        on_progress: ProgressCallback,
    ) -> Result<Arc<dyn IfcModel>> {
        ParsedModel::parse_with_progress(content, on_progress)
            .map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Parse into a shared model handle
pub fn parse(content: &str) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().parse(content)
}

/// [`parse`], reporting `(phase, percent)` along the way
pub fn parse_with_progress(
    content: &str,
    on_progress: impl Fn(&str, f32) + Send + 'static,
) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().parse_with_progress(content, Box::new(on_progress))
}
