// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-field check of the size properties

use serde::{Deserialize, Serialize};
use utsp_model::PropertyValue;

use crate::extract::PropertyMap;
use crate::outcome::ValidationOutcome;
use crate::schema::UtspProperty;

/// Shape implied by the dimensions that are set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionShape {
    Rectangular,
    Round,
}

/// Result of the dimension check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionCheck {
    pub outcome: ValidationOutcome,
    pub shape: Option<DimensionShape>,
}

impl DimensionCheck {
    fn shape(shape: DimensionShape, message: &str) -> Self {
        Self {
            outcome: ValidationOutcome::passed_with(message),
            shape: Some(shape),
        }
    }

    fn missing(message: &str) -> Self {
        Self {
            outcome: ValidationOutcome::error(message),
            shape: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.passed
    }
}

/// A dimension counts as set unless it is absent, blank, `0` or `0.0`
pub fn has_value(value: Option<&PropertyValue>) -> bool {
    value.is_some_and(|v| {
        let text = v.as_text();
        let text = text.trim();
        !text.is_empty() && text != "0" && text != "0.0"
    })
}

/// Decide between rectangular (width + height) and round (diameter)
///
/// Depth is never required.
pub fn check_dimensions(properties: &PropertyMap) -> DimensionCheck {
    let width = has_value(properties.value(UtspProperty::DimBredde.name()));
    let height = has_value(properties.value(UtspProperty::DimHoyde.name()));
    let diameter = has_value(properties.value(UtspProperty::DimDiameter.name()));

    match (width, height, diameter) {
        (true, true, _) => DimensionCheck::shape(
            DimensionShape::Rectangular,
            "Rektangulær: Bredde og Høyde angitt",
        ),
        (_, _, true) => DimensionCheck::shape(DimensionShape::Round, "Rund: Diameter angitt"),
        (true, false, false) => DimensionCheck::missing("Bredde angitt men Høyde mangler"),
        (false, true, false) => DimensionCheck::missing("Høyde angitt men Bredde mangler"),
        (false, false, false) => {
            DimensionCheck::missing("Dimensjoner mangler (enten Bredde+Høyde eller Diameter)")
        }
    }
}
