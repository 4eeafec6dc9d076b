// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property set access for IFC entities

use crate::{AttributeValue, EntityId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The unwrapped nominal value of a single-value property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Labels, identifiers, texts and enumerations
    Text(String),
    /// Integer and count measures
    Integer(i64),
    /// Length, area and other real measures
    Real(f64),
    /// IfcBoolean / IfcLogical
    Bool(bool),
}

impl PropertyValue {
    /// Convert a nominal value attribute (usually a typed value such as
    /// `IFCLABEL('x')` or `IFCLENGTHMEASURE(200.)`) into a property value.
    ///
    /// Measures written with an integer token still become reals unless the
    /// wrapper is an integer or count type.
    pub fn from_attribute(attr: &AttributeValue) -> Option<Self> {
        match attr {
            AttributeValue::Null | AttributeValue::Derived => None,
            AttributeValue::String(s) => Some(PropertyValue::Text(s.clone())),
            AttributeValue::Enum(s) => Some(PropertyValue::Text(s.clone())),
            AttributeValue::Bool(b) => Some(PropertyValue::Bool(*b)),
            AttributeValue::Integer(i) => Some(PropertyValue::Integer(*i)),
            AttributeValue::Float(f) => Some(PropertyValue::Real(*f)),
            AttributeValue::TypedValue(type_name, args) => {
                let inner = args.first()?;
                let upper = type_name.to_ascii_uppercase();
                match inner {
                    AttributeValue::Integer(i) if is_integer_type(&upper) => {
                        Some(PropertyValue::Integer(*i))
                    }
                    AttributeValue::Integer(i) => Some(PropertyValue::Real(*i as f64)),
                    AttributeValue::Enum(e) if upper == "IFCLOGICAL" && e == "U" => {
                        Some(PropertyValue::Text("UNKNOWN".to_string()))
                    }
                    other => Self::from_attribute(other),
                }
            }
            AttributeValue::EntityRef(_) | AttributeValue::List(_) => None,
        }
    }

    /// Textual form used when rules compare values and reports print them
    ///
    /// Integral reals keep one decimal (`200.0`), booleans print as
    /// `True` / `False`.
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Real(f) => format_real(*f),
            PropertyValue::Bool(true) => "True".to_string(),
            PropertyValue::Bool(false) => "False".to_string(),
        }
    }

    /// Borrow the text if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view, booleans excluded
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Real(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Real(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

fn is_integer_type(upper: &str) -> bool {
    matches!(upper, "IFCINTEGER" | "IFCCOUNTMEASURE" | "IFCTIMESTAMP")
}

fn format_real(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// A single named property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Nominal value, `None` when the property carries no value
    pub value: Option<PropertyValue>,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: Option<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A property set containing multiple properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Entity id of the IfcPropertySet
    pub id: EntityId,
    /// Property set name (e.g., "A4_Utsp")
    pub name: String,
    /// Properties in file order
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create a new, empty property set
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to this set
    pub fn add(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Property reader trait
///
/// Property sets come from IfcPropertySet entities linked via
/// IfcRelDefinesByProperties.
///
/// # Example
///
/// ```ignore
/// use utsp_model::{PropertyReader, EntityId};
///
/// fn show(props: &dyn PropertyReader, id: EntityId) {
///     for pset in props.property_sets(id) {
///         println!("Property Set: {}", pset.name);
///         for prop in &pset.properties {
///             println!("  {}: {:?}", prop.name, prop.value);
///         }
///     }
/// }
/// ```
pub trait PropertyReader: Send + Sync {
    /// Get all property sets associated with an entity
    ///
    /// Sets are returned in the order their associations appear in the file,
    /// empty sets included.
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet>;

    /// Get a specific property by name
    ///
    /// Searches all property sets for the entity and returns the first
    /// property with the matching name.
    fn get_property(&self, id: EntityId, name: &str) -> Option<Property> {
        self.property_sets(id)
            .into_iter()
            .flat_map(|pset| pset.properties)
            .find(|p| p.name == name)
    }

    /// Get entity's GlobalId (GUID)
    fn global_id(&self, id: EntityId) -> Option<String>;

    /// Get entity's Name attribute
    fn name(&self, id: EntityId) -> Option<String>;

    /// Get entity's ObjectType attribute
    fn object_type(&self, _id: EntityId) -> Option<String> {
        None
    }
}
