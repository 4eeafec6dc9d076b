// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Utsp Report - output formats for A4_Utsp validation results
//!
//! Three independent renderers consume [`utsp_rules::FileRecord`]s:
//!
//! - **Spreadsheet** ([`write_excel`]) - overview, per-file details and a
//!   findings sheet, or a single combined sheet
//! - **HTML** ([`HtmlReport`]) - standalone page with filters and search
//! - **Annotated IFC** ([`annotate`]) - the source model with a
//!   `NOSKI_Validering` property set per element, optionally colour-coded
//!
//! # Example
//!
//! ```ignore
//! use utsp_parser::ParsedModel;
//! use utsp_report::{annotate, write_excel, AnnotateOptions, ExcelLayout, HtmlReport};
//! use utsp_rules::{validate_model, ValidationConfig};
//!
//! let model = ParsedModel::open("A4_RIV_Hull.ifc")?;
//! let record = validate_model(&model, "A4_RIV_Hull.ifc", &ValidationConfig::default());
//!
//! let files = [record];
//! write_excel(&files, ExcelLayout::PerFile, "rapport.xlsx")?;
//! HtmlReport::new(&files).write_to("rapport.html")?;
//! let annotated = annotate(&model, &files[0], &AnnotateOptions::new())?;
//! ```

mod annotate;
mod error;
mod excel;
mod html;
mod messages;

pub use annotate::{annotate, annotate_to_path, AnnotateOptions, Annotated, VALIDATION_PSET};
pub use error::{ReportError, Result};
pub use excel::{excel_to_buffer, write_excel, ExcelLayout};
pub use html::{html_report, HtmlReport, PsetTile};
pub use messages::{dimension_status, join_or_dash, pset_status, validation_status, ElementMessages};
