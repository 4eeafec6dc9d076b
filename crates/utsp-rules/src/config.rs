// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use utsp_model::IfcType;

use crate::schema::DEFAULT_DISCIPLINES;

/// Settings for a validation run
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationConfig {
    /// Discipline codes looked for in file names (`RIV`, `RIE`, `RIVA`)
    pub disciplines: Vec<String>,
    /// IFC class holding the void markers
    pub element_type: IfcType,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            disciplines: DEFAULT_DISCIPLINES.iter().map(|s| s.to_string()).collect(),
            element_type: IfcType::IfcBuildingElementProxy,
        }
    }
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the discipline codes; an empty list keeps the defaults
    pub fn with_disciplines<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes: Vec<String> = codes.into_iter().map(Into::into).collect();
        if !codes.is_empty() {
            self.disciplines = codes;
        }
        self
    }

    /// Validate another element class
    pub fn with_element_type(mut self, element_type: IfcType) -> Self {
        self.element_type = element_type;
        self
    }
}
