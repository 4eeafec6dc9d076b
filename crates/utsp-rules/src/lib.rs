// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Utsp Rules - A4_Utsp property set validation
//!
//! Checks provision-for-void elements of an IFC model against the A4_Utsp
//! property set schema. Works on any model implementing the `utsp-model`
//! traits.
//!
//! Data flows one way: property sets are extracted per element, each
//! property is checked, the dimensions are cross-checked, and the outcomes
//! roll up into an [`ElementRecord`] and finally a [`FileRecord`].
//!
//! Validation failures are data, not errors: every finding is a
//! [`ValidationOutcome`] with a [`Severity`].
//!
//! # Example
//!
//! ```ignore
//! use utsp_parser::ParsedModel;
//! use utsp_rules::{validate_model, ValidationConfig};
//!
//! let model = ParsedModel::open("A4_RIV_Utsparinger.ifc")?;
//! let record = validate_model(&model, "A4_RIV_Utsparinger.ifc", &ValidationConfig::default());
//! println!("{} OK of {}", record.summary().ok, record.summary().total);
//! ```

pub mod config;
pub mod dimensions;
pub mod element;
pub mod extract;
pub mod file;
pub mod outcome;
pub mod schema;
pub mod validators;

pub use config::ValidationConfig;
pub use dimensions::{check_dimensions, has_value, DimensionCheck, DimensionShape};
pub use element::{validate_element, ElementIdentity, ElementRecord, ElementStatus, UNNAMED};
pub use extract::{extract, Extraction, PropertyMap, PsetLocation};
pub use file::{expected_prefix, validate_model, FileRecord, FileSummary};
pub use outcome::{Severity, ValidationOutcome};
pub use schema::{UtspProperty, DEFAULT_DISCIPLINES, PROPERTY_PREFIX, REQUIRED_PSET};
pub use validators::validate_property;
