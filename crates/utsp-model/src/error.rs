// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors raised while reading or writing a model

use crate::EntityId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Reading failures
///
/// Only structural problems are errors. Missing or odd property values are
/// left to the validation rules to report.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Not a STEP file, or a broken DATA section
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }
}
