// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation of a single element

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Serialize, Serializer};
use utsp_model::{DecodedEntity, EntityId, IfcModel};

use crate::dimensions::{check_dimensions, DimensionCheck};
use crate::extract::{extract, Extraction, PropertyMap, PsetLocation};
use crate::outcome::ValidationOutcome;
use crate::schema::UtspProperty;
use crate::validators::validate_property;

/// Name shown for elements without a Name attribute
pub const UNNAMED: &str = "(uten navn)";

/// Overall verdict for an element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementStatus {
    Ok,
    Error,
    Warning,
    MissingPropertySet,
}

impl ElementStatus {
    /// Label used in every report
    pub fn label(&self) -> &'static str {
        match self {
            ElementStatus::Ok => "OK",
            ElementStatus::Error => "Feil",
            ElementStatus::Warning => "Advarsel",
            ElementStatus::MissingPropertySet => "Mangler pset",
        }
    }

    fn from_counts(errors: usize, warnings: usize) -> Self {
        if errors > 0 {
            ElementStatus::Error
        } else if warnings > 0 {
            ElementStatus::Warning
        } else {
            ElementStatus::Ok
        }
    }
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ElementStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Who the element is
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementIdentity {
    #[serde(skip)]
    pub entity_id: EntityId,
    pub global_id: String,
    pub name: String,
    /// IFC class, e.g. `IfcBuildingElementProxy`
    pub ifc_type: String,
    pub object_type: Option<String>,
}

impl ElementIdentity {
    /// Read identity attributes of a model element
    pub fn of(model: &dyn IfcModel, entity: &DecodedEntity) -> Self {
        let props = model.properties();
        Self {
            entity_id: entity.id,
            global_id: props.global_id(entity.id).unwrap_or_default(),
            name: props
                .name(entity.id)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNNAMED.to_string()),
            ifc_type: entity.ifc_type.name().to_string(),
            object_type: props.object_type(entity.id).filter(|t| !t.is_empty()),
        }
    }
}

/// Validation result for one element
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementRecord {
    #[serde(flatten)]
    pub identity: ElementIdentity,
    pub location: PsetLocation,
    pub all_psets: Vec<String>,
    pub properties: PropertyMap,
    /// One outcome per checked property, in schema order
    pub validations: BTreeMap<UtspProperty, ValidationOutcome>,
    pub dimension: Option<DimensionCheck>,
    pub status: ElementStatus,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ElementRecord {
    /// Apply every rule to what the extractor found
    pub fn evaluate(
        identity: ElementIdentity,
        extraction: Extraction,
        expected_prefix: Option<&str>,
    ) -> Self {
        let Extraction {
            location,
            properties,
            all_psets,
        } = extraction;

        if !location.is_found() {
            return Self {
                identity,
                location,
                all_psets,
                properties: PropertyMap::default(),
                validations: BTreeMap::new(),
                dimension: None,
                status: ElementStatus::MissingPropertySet,
                error_count: 1,
                warning_count: 0,
            };
        }

        let mut validations = BTreeMap::new();
        let mut errors = 0;
        let mut warnings = 0;

        for &property in UtspProperty::REQUIRED {
            let outcome =
                validate_property(property, properties.value(property.name()), expected_prefix);
            errors += usize::from(outcome.counts_as_error());
            warnings += usize::from(outcome.counts_as_warning());
            validations.insert(property, outcome);
        }

        for &property in UtspProperty::OPTIONAL {
            if properties.contains(property.name()) {
                let outcome = validate_property(property, properties.value(property.name()), None);
                warnings += usize::from(outcome.counts_as_warning());
                validations.insert(property, outcome);
            }
        }

        let dimension = check_dimensions(&properties);
        if !dimension.passed() {
            errors += 1;
        }

        if !location.is_exact() {
            warnings += 1;
        }

        Self {
            identity,
            location,
            all_psets,
            properties,
            validations,
            dimension: Some(dimension),
            status: ElementStatus::from_counts(errors, warnings),
            error_count: errors,
            warning_count: warnings,
        }
    }

    /// The property set was found under its proper name
    pub fn has_pset(&self) -> bool {
        self.location.is_exact()
    }

    pub fn outcome(&self, property: UtspProperty) -> Option<&ValidationOutcome> {
        self.validations.get(&property)
    }
}

/// Validate one model element
pub fn validate_element(
    model: &dyn IfcModel,
    entity: &DecodedEntity,
    expected_prefix: Option<&str>,
) -> ElementRecord {
    let identity = ElementIdentity::of(model, entity);
    let psets = model.properties().property_sets(entity.id);
    let record = ElementRecord::evaluate(identity, extract(&psets), expected_prefix);
    debug!(
        "{} {}: {} ({} errors, {} warnings)",
        record.identity.entity_id,
        record.identity.global_id,
        record.status,
        record.error_count,
        record.warning_count
    );
    record
}
