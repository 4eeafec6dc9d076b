// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-element message texts shared by every report

use utsp_rules::{ElementRecord, ElementStatus, PsetLocation};

/// Findings of one element, split by severity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementMessages {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ElementMessages {
    pub fn of(element: &ElementRecord) -> Self {
        let mut messages = Self::default();

        for (property, outcome) in &element.validations {
            let line = format!("{}: {}", property.short_name(), outcome.message);
            if outcome.counts_as_error() {
                messages.errors.push(line);
            } else if outcome.counts_as_warning() {
                messages.warnings.push(line);
            }
        }

        if let Some(dimension) = element.dimension.as_ref().filter(|d| !d.passed()) {
            messages
                .errors
                .push(format!("Dimensjoner: {}", dimension.outcome.message));
        }

        match &element.location {
            PsetLocation::Missing if element.all_psets.is_empty() => messages
                .errors
                .push("Mangler A4_Utsp. Sjekk GUID i IFC".to_string()),
            PsetLocation::Missing => messages
                .errors
                .push(format!("Mangler A4_Utsp. Har: {}", element.all_psets.join(", "))),
            PsetLocation::Misplaced(_) => messages
                .warnings
                .push(format!("Egenskaper i feil pset: {}", element.location)),
            PsetLocation::Exact => {}
        }

        messages
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// `FEIL: …` lines followed by `ADVARSEL: …` lines
    pub fn lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|m| format!("FEIL: {}", m))
            .chain(self.warnings.iter().map(|m| format!("ADVARSEL: {}", m)))
            .collect()
    }

    /// All lines joined with `; `, or `-` when there is nothing to report
    pub fn summary(&self) -> String {
        if self.is_empty() {
            "-".to_string()
        } else {
            self.lines().join("; ")
        }
    }
}

/// Approval wording written back into the model
pub fn validation_status(status: ElementStatus) -> &'static str {
    match status {
        ElementStatus::Ok => "Godkjent",
        ElementStatus::Warning => "Godkjent med advarsler",
        ElementStatus::Error => "Ikke godkjent",
        ElementStatus::MissingPropertySet => "Mangler A4_Utsp",
    }
}

pub fn pset_status(location: &PsetLocation) -> String {
    match location {
        PsetLocation::Exact => "OK".to_string(),
        PsetLocation::Misplaced(_) => format!("Feil plassering: {}", location),
        PsetLocation::Missing => "Mangler".to_string(),
    }
}

pub fn dimension_status(element: &ElementRecord) -> &str {
    element
        .dimension
        .as_ref()
        .map(|d| d.outcome.message.as_str())
        .unwrap_or("Ikke validert")
}

/// Comma separated list, `-` when empty
pub fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use utsp_model::{EntityId, Property, PropertySet, PropertyValue};
    use utsp_rules::{extract, ElementIdentity, ElementRecord, FileRecord};

    pub const VALID: &[(&str, &str)] = &[
        ("A4_Utsp_Kategori", "ProvisionForVoid"),
        ("A4_Utsp_ID", "RIV_Hull-1"),
        ("A4_Utsp_Utsparingstype", "Utsparing"),
        ("A4_Utsp_Tetting", "Ja"),
        ("A4_Utsp_Fase", "Fase 1"),
        ("A4_Utsp_Status", "Godkjent"),
        ("A4_Utsp_Rev", "0"),
        ("A4_Utsp_RevDato", "01.01.2024"),
        ("A4_Utsp_RevBeskrivelse", "Initial"),
        ("A4_Utsp_DimBredde", "200"),
        ("A4_Utsp_DimHøyde", "300"),
    ];

    pub fn pset(name: &str, props: &[(&str, &str)]) -> PropertySet {
        let mut set = PropertySet::new(EntityId(900), name);
        for (key, value) in props {
            set.add(Property::new(*key, Some(PropertyValue::from(*value))));
        }
        set
    }

    /// Valid properties with some replaced
    pub fn with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        VALID
            .iter()
            .map(|(k, v)| {
                overrides
                    .iter()
                    .find(|(ok, _)| ok == k)
                    .copied()
                    .unwrap_or((*k, *v))
            })
            .collect()
    }

    pub fn element(id: u32, name: &str, psets: &[PropertySet]) -> ElementRecord {
        let identity = ElementIdentity {
            entity_id: EntityId(id),
            global_id: format!("guid-{}", id),
            name: name.to_string(),
            ifc_type: "IfcBuildingElementProxy".to_string(),
            object_type: None,
        };
        ElementRecord::evaluate(identity, extract(psets), Some("RIV"))
    }

    /// One element of each status
    pub fn mixed_file(filename: &str) -> FileRecord {
        let elements = vec![
            element(1, "OK", &[pset("A4_Utsp", VALID)]),
            element(2, "Feil", &[pset("A4_Utsp", &with(&[("A4_Utsp_Fase", "Fase 3")]))]),
            element(3, "Advarsel", &[pset("Utsparing", VALID)]),
            element(4, "Mangler", &[pset("Pset_ProxyCommon", &[])]),
        ];
        FileRecord::new(filename, Some("RIV".to_string()), elements)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_clean_element_has_no_messages() {
        let ok = element(1, "Hull", &[pset("A4_Utsp", VALID)]);
        let messages = ElementMessages::of(&ok);
        assert!(messages.is_empty());
        assert_eq!(messages.summary(), "-");
        assert_eq!(validation_status(ok.status), "Godkjent");
        assert_eq!(pset_status(&ok.location), "OK");
        assert_eq!(dimension_status(&ok), "Rektangulær: Bredde og Høyde angitt");
    }

    #[test]
    fn test_errors_before_warnings() {
        let record = element(
            1,
            "Hull",
            &[pset(
                "Egne",
                &with(&[
                    ("A4_Utsp_Utsparingstype", "Innstøpningsgods"),
                    ("A4_Utsp_Rev", "x"),
                    ("A4_Utsp_DimHøyde", "0"),
                ]),
            )],
        );
        let messages = ElementMessages::of(&record);
        assert_eq!(
            messages.errors,
            vec![
                "Rev: Ugyldig revisjonsnummer: 'x' (forventet: 0, 1, 2, ...)",
                "Dimensjoner: Bredde angitt men Høyde mangler",
            ]
        );
        assert_eq!(
            messages.warnings,
            vec![
                "Utsparingstype: Innstøpningsgods skal normalt ikke være i utsparings-IFC",
                "Egenskaper i feil pset: Egne (feil plassering)",
            ]
        );
        assert!(messages.summary().starts_with("FEIL: Rev: "));
        assert_eq!(messages.lines().len(), 4);
        assert_eq!(pset_status(&record.location), "Feil plassering: Egne (feil plassering)");
        assert_eq!(validation_status(record.status), "Ikke godkjent");
    }

    #[test]
    fn test_missing_pset_messages() {
        let other = element(1, "Hull", &[pset("Pset_ProxyCommon", &[]), pset("Pset_Egen", &[])]);
        assert_eq!(
            ElementMessages::of(&other).summary(),
            "FEIL: Mangler A4_Utsp. Har: Pset_ProxyCommon, Pset_Egen"
        );
        assert_eq!(dimension_status(&other), "Ikke validert");
        assert_eq!(pset_status(&other.location), "Mangler");

        let bare = element(2, "Hull", &[]);
        assert_eq!(
            ElementMessages::of(&bare).summary(),
            "FEIL: Mangler A4_Utsp. Sjekk GUID i IFC"
        );
        assert_eq!(validation_status(bare.status), "Mangler A4_Utsp");
    }

    #[test]
    fn test_join_or_dash() {
        assert_eq!(join_or_dash(&[]), "-");
        assert_eq!(join_or_dash(&["A".to_string(), "B".to_string()]), "A, B");
    }
}
