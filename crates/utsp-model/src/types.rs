// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entities, attribute values and header metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// STEP instance number, `#123` in the file
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! ifc_types {
    ($( $(#[$doc:meta])* $variant:ident ),* $(,)?) => {
        /// IFC entity classes known to this crate
        ///
        /// Only the classes the validator reads or writes are named. Everything
        /// else is captured as `Unknown` with its original spelling.
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        pub enum IfcType {
            $( $(#[$doc])* $variant, )*
            /// Unknown type - stores the original type name string
            Unknown(String),
        }

        impl IfcType {
            /// Parse a type name string into an IfcType (case-insensitive)
            pub fn parse(s: &str) -> Self {
                $(
                    if s.eq_ignore_ascii_case(stringify!($variant)) {
                        return IfcType::$variant;
                    }
                )*
                IfcType::Unknown(s.to_string())
            }

            /// Schema spelling of the class, e.g. `IfcBuildingElementProxy`
            pub fn name(&self) -> &str {
                match self {
                    $( IfcType::$variant => stringify!($variant), )*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    // Spatial structure
    IfcProject,
    IfcOwnerHistory,

    // Elements that may carry provision-for-void data
    IfcBuildingElementProxy,
    IfcOpeningElement,
    IfcVoidingFeature,

    // Relationships
    IfcRelDefinesByProperties,

    // Properties
    IfcPropertySet,
    IfcPropertySingleValue,
    IfcPropertyEnumeratedValue,
    IfcPropertyBoundedValue,
    IfcPropertyListValue,
    IfcElementQuantity,

    // Representations
    IfcProductDefinitionShape,
    IfcShapeRepresentation,
    IfcMappedItem,

    // Presentation (styling)
    IfcStyledItem,
    IfcSurfaceStyle,
    IfcSurfaceStyleRendering,
    IfcColourRgb,
    IfcPresentationStyleAssignment,
}

impl IfcType {
    /// Upper-case spelling used in STEP instance lines, e.g. `IFCPROPERTYSET`
    pub fn step_name(&self) -> String {
        self.name().to_ascii_uppercase()
    }
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One attribute of a STEP instance
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// `$`
    #[default]
    Null,
    /// `*`
    Derived,
    EntityRef(EntityId),
    /// `.T.` / `.F.`
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Quoted string with STEP escapes decoded
    String(String),
    /// `.NAME.` other than the booleans
    Enum(String),
    List(Vec<AttributeValue>),
    /// Defined-type wrapper such as `IFCLABEL('x')`, name kept as written
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// String content, looking through a typed wrapper
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) => args.first().and_then(AttributeValue::as_string),
            _ => None,
        }
    }

    /// Numeric content, looking through a typed wrapper
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) => args.first().and_then(AttributeValue::as_float),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A decoded STEP instance
///
/// Attributes are positional, in schema order; accessors return `None` for
/// out-of-range indices and for values of another kind.
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    pub id: EntityId,
    pub ifc_type: IfcType,
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index)?.as_entity_ref()
    }

    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index)?.as_string()
    }

    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index)?.as_float()
    }

    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index)?.as_list()
    }

    /// References in a list attribute; other list items are skipped
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        let items = self.get_list(index)?;
        Some(items.iter().filter_map(AttributeValue::as_entity_ref).collect())
    }
}

/// Header fields of an IFC file
///
/// `FILE_SCHEMA` gives the schema; the rest comes from `FILE_NAME` and is
/// `None` when the exporter left it blank.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// e.g. `IFC2X3`, `IFC4`
    pub schema_version: String,
    pub originating_system: Option<String>,
    pub preprocessor_version: Option<String>,
    pub file_name: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub timestamp: Option<String>,
}

impl ModelMetadata {
    /// True for IFC2X3 files, which need the older presentation style wrapper
    pub fn is_ifc2x3(&self) -> bool {
        self.schema_version.to_ascii_uppercase().starts_with("IFC2X3")
    }
}
