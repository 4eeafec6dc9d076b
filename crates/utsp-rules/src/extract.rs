// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locating the A4_Utsp property set and collecting its values

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use utsp_model::{PropertySet, PropertyValue};

use crate::schema::{is_schema_property, PROPERTY_PREFIX, REQUIRED_PSET};

/// Property values keyed by name, in first-seen order
///
/// Inserting an existing key replaces its value but keeps its position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Option<PropertyValue>)>,
}

impl PropertyMap {
    pub fn insert(&mut self, name: &str, value: Option<PropertyValue>) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// The property was seen, with or without a value
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Value of a property, `None` when missing or without a value
    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&PropertyValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Where the A4_Utsp properties were found on an element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PsetLocation {
    /// In a property set named exactly `A4_Utsp`
    Exact,
    /// In another property set holding `A4_Utsp_*` properties
    Misplaced(String),
    /// Nowhere
    #[default]
    Missing,
}

impl PsetLocation {
    /// Location implied by a single property set
    fn of(pset: &PropertySet) -> Self {
        if pset.name == REQUIRED_PSET {
            PsetLocation::Exact
        } else if pset.properties.iter().any(|p| p.name.starts_with(PROPERTY_PREFIX)) {
            PsetLocation::Misplaced(pset.name.clone())
        } else {
            PsetLocation::Missing
        }
    }

    /// Combine with the next property set's location
    ///
    /// An exact match always wins; otherwise the first misplaced set stays.
    fn merge(self, next: PsetLocation) -> Self {
        match (self, next) {
            (PsetLocation::Exact, _) | (_, PsetLocation::Exact) => PsetLocation::Exact,
            (PsetLocation::Missing, next) => next,
            (current, _) => current,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, PsetLocation::Missing)
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, PsetLocation::Exact)
    }

    /// Display label, `None` when missing
    pub fn label(&self) -> Option<String> {
        match self {
            PsetLocation::Exact => Some(REQUIRED_PSET.to_string()),
            PsetLocation::Misplaced(name) => Some(format!("{} (feil plassering)", name)),
            PsetLocation::Missing => None,
        }
    }
}

impl fmt::Display for PsetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => f.write_str("-"),
        }
    }
}

impl Serialize for PsetLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.label().serialize(serializer)
    }
}

/// Everything the extractor learned about one element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub location: PsetLocation,
    pub properties: PropertyMap,
    /// Names of every property set on the element, in association order
    pub all_psets: Vec<String>,
}

/// Fold over an element's property sets
///
/// Every set contributes its name; schema properties from every set are
/// merged with later sets overwriting earlier ones.
pub fn extract(psets: &[PropertySet]) -> Extraction {
    psets.iter().fold(Extraction::default(), |mut acc, pset| {
        acc.all_psets.push(pset.name.clone());
        acc.location = acc.location.merge(PsetLocation::of(pset));
        for prop in pset.properties.iter().filter(|p| is_schema_property(&p.name)) {
            acc.properties.insert(&prop.name, prop.value.clone());
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use utsp_model::{EntityId, Property};

    fn pset(id: u32, name: &str, props: &[(&str, Option<&str>)]) -> PropertySet {
        PropertySet {
            id: EntityId(id),
            name: name.to_string(),
            properties: props
                .iter()
                .map(|(n, v)| Property::new(*n, v.map(PropertyValue::from)))
                .collect(),
        }
    }

    #[test]
    fn test_exact_pset() {
        let result = extract(&[
            pset(1, "Pset_ProxyCommon", &[("Reference", Some("x"))]),
            pset(2, "A4_Utsp", &[("A4_Utsp_ID", Some("RIV_Hull-1"))]),
        ]);
        assert_eq!(result.location, PsetLocation::Exact);
        assert_eq!(result.all_psets, vec!["Pset_ProxyCommon", "A4_Utsp"]);
        assert_eq!(result.properties.len(), 1);
        assert!(!result.properties.contains("Reference"));
    }

    #[test]
    fn test_exact_wins_regardless_of_order() {
        let misplaced = pset(1, "Egendefinert", &[("A4_Utsp_ID", Some("RIV_Hull-1"))]);
        let exact = pset(2, "A4_Utsp", &[("A4_Utsp_Fase", Some("Fase 1"))]);

        let before = extract(&[misplaced.clone(), exact.clone()]);
        let after = extract(&[exact, misplaced]);
        assert_eq!(before.location, PsetLocation::Exact);
        assert_eq!(after.location, PsetLocation::Exact);
    }

    #[test]
    fn test_first_misplaced_wins_but_names_keep_collecting() {
        let result = extract(&[
            pset(1, "Første", &[("A4_Utsp_ID", Some("RIV_Hull-1"))]),
            pset(2, "Andre", &[("A4_Utsp_Fase", Some("Fase 1"))]),
            pset(3, "Tredje", &[]),
        ]);
        assert_eq!(result.location, PsetLocation::Misplaced("Første".into()));
        assert_eq!(result.location.to_string(), "Første (feil plassering)");
        assert_eq!(result.all_psets.len(), 3);
        assert!(result.properties.contains("A4_Utsp_Fase"));
    }

    #[test]
    fn test_later_value_overwrites_in_place() {
        let result = extract(&[
            pset(1, "A4_Utsp", &[("A4_Utsp_Rev", Some("0")), ("A4_Utsp_Fase", Some("Fase 1"))]),
            pset(2, "Kopi", &[("A4_Utsp_Rev", Some("1"))]),
        ]);
        let keys: Vec<&str> = result.properties.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A4_Utsp_Rev", "A4_Utsp_Fase"]);
        assert_eq!(
            result.properties.value("A4_Utsp_Rev"),
            Some(&PropertyValue::from("1"))
        );
    }

    #[test]
    fn test_absent_nominal_value_is_recorded() {
        let result = extract(&[pset(1, "A4_Utsp", &[("A4_Utsp_Funksjon", None)])]);
        assert!(result.properties.contains("A4_Utsp_Funksjon"));
        assert_eq!(result.properties.value("A4_Utsp_Funksjon"), None);
    }

    #[test]
    fn test_unrelated_psets_are_missing() {
        let result = extract(&[pset(1, "Pset_ProxyCommon", &[("Reference", Some("x"))])]);
        assert_eq!(result.location, PsetLocation::Missing);
        assert_eq!(result.location.to_string(), "-");
        assert!(extract(&[]).all_psets.is_empty());
    }
}
