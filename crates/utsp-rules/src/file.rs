// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation of every void element in one model

use std::path::Path;

use log::info;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use utsp_model::IfcModel;

use crate::config::ValidationConfig;
use crate::element::{validate_element, ElementRecord, ElementStatus};

/// Tallies over a file's elements
///
/// `ok + feil + advarsel + mangler_pset == total` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub total: usize,
    pub ok: usize,
    pub feil: usize,
    pub advarsel: usize,
    pub mangler_pset: usize,
    /// Elements carrying the property set under its exact name
    pub has_pset: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl FileSummary {
    pub fn from_elements(elements: &[ElementRecord]) -> Self {
        elements.iter().fold(Self::default(), |mut acc, element| {
            acc.total += 1;
            match element.status {
                ElementStatus::Ok => acc.ok += 1,
                ElementStatus::Error => acc.feil += 1,
                ElementStatus::Warning => acc.advarsel += 1,
                ElementStatus::MissingPropertySet => acc.mangler_pset += 1,
            }
            acc.has_pset += usize::from(element.has_pset());
            acc.total_errors += element.error_count;
            acc.total_warnings += element.warning_count;
            acc
        })
    }

    /// Share of elements with the property set, in percent
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.has_pset as f64 * 100.0 / self.total as f64
        }
    }

    /// Share of elements without any finding, in percent
    pub fn approval_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.ok as f64 * 100.0 / self.total as f64
        }
    }

    /// Add another file's tallies
    pub fn merge(mut self, other: &FileSummary) -> Self {
        self.total += other.total;
        self.ok += other.ok;
        self.feil += other.feil;
        self.advarsel += other.advarsel;
        self.mangler_pset += other.mangler_pset;
        self.has_pset += other.has_pset;
        self.total_errors += other.total_errors;
        self.total_warnings += other.total_warnings;
        self
    }
}

/// Validation result for one file
#[derive(Clone, Debug, PartialEq)]
pub struct FileRecord {
    pub filename: String,
    /// Discipline code taken from the file name, if any
    pub expected_prefix: Option<String>,
    elements: Vec<ElementRecord>,
    summary: FileSummary,
}

impl FileRecord {
    pub fn new(
        filename: impl Into<String>,
        expected_prefix: Option<String>,
        elements: Vec<ElementRecord>,
    ) -> Self {
        let summary = FileSummary::from_elements(&elements);
        Self {
            filename: filename.into(),
            expected_prefix,
            elements,
            summary,
        }
    }

    /// Elements in model order
    pub fn elements(&self) -> &[ElementRecord] {
        &self.elements
    }

    pub fn summary(&self) -> &FileSummary {
        &self.summary
    }
}

impl Serialize for FileRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("FileRecord", 4)?;
        record.serialize_field("filename", &self.filename)?;
        record.serialize_field("expected_prefix", &self.expected_prefix)?;
        record.serialize_field("summary", &self.summary)?;
        record.serialize_field("elements", &self.elements)?;
        record.end()
    }
}

/// Discipline code named in a file name, e.g. `A4_RIV_Utsparinger.ifc` → `RIV`
///
/// The stem is split on `_`; a single-segment stem never yields a prefix.
pub fn expected_prefix<S: AsRef<str>>(filename: &str, codes: &[S]) -> Option<String> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    parts
        .into_iter()
        .find(|part| codes.iter().any(|code| code.as_ref() == *part))
        .map(str::to_string)
}

/// Validate every element of the configured class, in file order
pub fn validate_model(model: &dyn IfcModel, filename: &str, config: &ValidationConfig) -> FileRecord {
    let prefix = expected_prefix(filename, &config.disciplines);
    let entities = model.resolver().entities_by_type(&config.element_type);
    info!(
        "{}: {} {} elements, expected prefix {}",
        filename,
        entities.len(),
        config.element_type,
        prefix.as_deref().unwrap_or("-")
    );

    let elements = entities
        .iter()
        .map(|entity| validate_element(model, entity, prefix.as_deref()))
        .collect();

    FileRecord::new(filename, prefix, elements)
}
