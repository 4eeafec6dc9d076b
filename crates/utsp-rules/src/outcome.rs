// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Result of checking a single property

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a finding is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Lower-case tag used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one validator
///
/// A passing outcome normally carries `Severity::Error` with message `OK`;
/// the severity only matters once something is wrong or worth noting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub message: String,
    pub severity: Severity,
}

impl ValidationOutcome {
    /// Passed without remarks
    pub fn ok() -> Self {
        Self::passed_with("OK")
    }

    /// Passed with a descriptive message (e.g. the detected dimension shape)
    pub fn passed_with(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Failed
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Accepted, but worth a warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Informational note on an accepted value
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Counts towards the element's error total
    pub fn counts_as_error(&self) -> bool {
        !self.passed && self.severity == Severity::Error
    }

    /// Counts towards the element's warning total, passed or not
    pub fn counts_as_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
