// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Utsp Model - Trait definitions and shared types for reading IFC models
//!
//! This crate provides the abstractions the validation engine works against.
//! A parser backend implements the traits; the rules only ever see a
//! `&dyn IfcModel`, so the STEP reader can be swapped without touching them.
//!
//! # Architecture
//!
//! - [`IfcParser`] - Entry point for parsing IFC content
//! - [`IfcModel`] - Read-only access to a parsed IFC model
//! - [`EntityResolver`] - Entity lookup and reference resolution
//! - [`PropertyReader`] - Property sets attached to elements
//!
//! # Example
//!
//! ```ignore
//! use utsp_model::{IfcModel, IfcType};
//!
//! let model = utsp_parser::parse(ifc_content)?;
//! for proxy in model.resolver().entities_by_type(&IfcType::IfcBuildingElementProxy) {
//!     for pset in model.properties().property_sets(proxy.id) {
//!         println!("{}: {} properties", pset.name, pset.properties.len());
//!     }
//! }
//! ```

pub mod error;
pub mod properties;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use properties::*;
pub use resolver::*;
pub use traits::*;
pub use types::*;
