// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The A4_Utsp property set schema
//!
//! Names and allowed values for the provision-for-void property set as laid
//! down in the project's BIM execution plan.

use serde::{Serialize, Serializer};
use std::fmt;

/// Name of the property set every void element must carry
pub const REQUIRED_PSET: &str = "A4_Utsp";

/// Prefix shared by all schema property names
pub const PROPERTY_PREFIX: &str = "A4_Utsp_";

/// Allowed category
pub const VALID_KATEGORI: &[&str] = &["ProvisionForVoid"];
/// Opening types accepted without remarks
pub const VALID_UTSPARINGSTYPE: &[&str] = &["Utsparing", "Hulltaking"];
/// Opening type accepted with a warning
pub const CAST_IN_ITEM: &str = "Innstøpningsgods";
/// Allowed textual sealing flags
pub const VALID_TETTING: &[&str] = &["Ja", "Nei"];
pub const VALID_FASE: &[&str] = &["Fase 1", "Fase 2"];
pub const VALID_STATUS: &[&str] = &["Godkjent", "Ikke godkjent", "Behandles av RIB"];
/// Known function tokens
pub const VALID_FUNKSJON: &[&str] = &["Bæring", "Vanntetting", "Brann", "Lyd"];

/// Discipline codes recognised in file names
pub const DEFAULT_DISCIPLINES: &[&str] = &["RIV", "RIE", "RIVA"];

macro_rules! utsp_properties {
    ($( $variant:ident => $short:literal ),* $(,)?) => {
        /// Every property of the A4_Utsp schema
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum UtspProperty {
            $( $variant, )*
        }

        impl UtspProperty {
            /// All schema properties in declaration order
            pub const ALL: &'static [UtspProperty] = &[$( UtspProperty::$variant, )*];

            /// Name without the `A4_Utsp_` prefix, e.g. `Kategori`
            pub fn short_name(&self) -> &'static str {
                match self {
                    $( UtspProperty::$variant => $short, )*
                }
            }

            /// Full property name, e.g. `A4_Utsp_Kategori`
            pub fn name(&self) -> &'static str {
                match self {
                    $( UtspProperty::$variant => concat!("A4_Utsp_", $short), )*
                }
            }

            /// Look up a property by its full name
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|p| p.name() == name)
            }
        }
    };
}

utsp_properties! {
    Kategori => "Kategori",
    Id => "ID",
    Utsparingstype => "Utsparingstype",
    Tetting => "Tetting",
    Fase => "Fase",
    Status => "Status",
    Rev => "Rev",
    RevDato => "RevDato",
    RevBeskrivelse => "RevBeskrivelse",
    DimBredde => "DimBredde",
    DimHoyde => "DimHøyde",
    DimDybde => "DimDybde",
    DimDiameter => "DimDiameter",
    Funksjon => "Funksjon",
}

impl UtspProperty {
    /// The nine properties every element must carry, in check order
    pub const REQUIRED: &'static [UtspProperty] = &[
        UtspProperty::Kategori,
        UtspProperty::Id,
        UtspProperty::Utsparingstype,
        UtspProperty::Tetting,
        UtspProperty::Fase,
        UtspProperty::Status,
        UtspProperty::Rev,
        UtspProperty::RevDato,
        UtspProperty::RevBeskrivelse,
    ];

    /// Size properties checked together
    pub const DIMENSIONS: &'static [UtspProperty] = &[
        UtspProperty::DimBredde,
        UtspProperty::DimHoyde,
        UtspProperty::DimDybde,
        UtspProperty::DimDiameter,
    ];

    /// Checked only when present
    pub const OPTIONAL: &'static [UtspProperty] = &[UtspProperty::Funksjon];

    /// Required and optional properties, in the order reports list their checks
    pub fn validated() -> impl Iterator<Item = UtspProperty> {
        Self::REQUIRED.iter().chain(Self::OPTIONAL).copied()
    }
}

impl fmt::Display for UtspProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for UtspProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Whether a property name belongs to the schema's namespace
pub fn is_schema_property(name: &str) -> bool {
    name.starts_with(PROPERTY_PREFIX) || UtspProperty::from_name(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(UtspProperty::Id.name(), "A4_Utsp_ID");
        assert_eq!(UtspProperty::DimHoyde.name(), "A4_Utsp_DimHøyde");
        assert_eq!(UtspProperty::DimHoyde.short_name(), "DimHøyde");
        assert_eq!(
            UtspProperty::from_name("A4_Utsp_RevDato"),
            Some(UtspProperty::RevDato)
        );
        assert_eq!(UtspProperty::from_name("A4_Utsp_Ukjent"), None);
    }

    #[test]
    fn test_groups_cover_schema() {
        assert_eq!(UtspProperty::ALL.len(), 14);
        assert_eq!(
            UtspProperty::REQUIRED.len() + UtspProperty::DIMENSIONS.len() + UtspProperty::OPTIONAL.len(),
            UtspProperty::ALL.len()
        );
        assert_eq!(UtspProperty::validated().count(), 10);
    }

    #[test]
    fn test_namespace() {
        assert!(is_schema_property("A4_Utsp_Kategori"));
        assert!(is_schema_property("A4_Utsp_Custom"));
        assert!(!is_schema_property("Reference"));
    }
}
