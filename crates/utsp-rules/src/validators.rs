// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-property validators
//!
//! Each validator maps the raw nominal value of one property (or `None` when
//! absent) to a [`ValidationOutcome`]. Messages are in Norwegian, the
//! language of the reports.

use std::sync::LazyLock;

use regex::Regex;
use utsp_model::PropertyValue;

use crate::outcome::ValidationOutcome;
use crate::schema::{
    UtspProperty, CAST_IN_ITEM, VALID_FASE, VALID_FUNKSJON, VALID_KATEGORI, VALID_STATUS,
    VALID_TETTING, VALID_UTSPARINGSTYPE,
};

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,4}_Hull-\d+$").expect("ID pattern"));
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("date pattern"));

/// Text of a value, `None` when absent or blank after trimming
fn present(value: Option<&PropertyValue>) -> Option<String> {
    value.map(PropertyValue::as_text).filter(|s| !s.trim().is_empty())
}

/// Category must be exactly `ProvisionForVoid` (compared untrimmed)
pub fn validate_kategori(value: Option<&PropertyValue>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::error("Kategori mangler");
    };
    if VALID_KATEGORI.contains(&text.as_str()) {
        return ValidationOutcome::ok();
    }
    ValidationOutcome::error(format!(
        "Ugyldig kategori: '{}' (forventet: ProvisionForVoid)",
        text
    ))
}

/// ID must look like `RIV_Hull-12`; a differing discipline prefix is a warning
pub fn validate_id(value: Option<&PropertyValue>, expected_prefix: Option<&str>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::error("ID mangler");
    };
    let id = text.trim();
    if !ID_PATTERN.is_match(id) {
        return ValidationOutcome::error(format!(
            "Ugyldig ID-format: '{}' (forventet: XXX_Hull-nn)",
            id
        ));
    }

    if let Some(expected) = expected_prefix.filter(|p| !p.is_empty()) {
        let prefix = id.split('_').next().unwrap_or_default();
        if prefix != expected {
            return ValidationOutcome::warning(format!(
                "ID-prefiks '{}' matcher ikke forventet '{}'",
                prefix, expected
            ));
        }
    }

    ValidationOutcome::ok()
}

pub fn validate_utsparingstype(value: Option<&PropertyValue>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::error("Utsparingstype mangler");
    };
    let kind = text.trim();
    if VALID_UTSPARINGSTYPE.contains(&kind) {
        return ValidationOutcome::ok();
    }
    if kind == CAST_IN_ITEM {
        return ValidationOutcome::warning(
            "Innstøpningsgods skal normalt ikke være i utsparings-IFC",
        );
    }
    ValidationOutcome::error(format!("Ugyldig utsparingstype: '{}'", kind))
}

/// Sealing flag: any native boolean, or the text `Ja` / `Nei`
pub fn validate_tetting(value: Option<&PropertyValue>) -> ValidationOutcome {
    if let Some(PropertyValue::Bool(_)) = value {
        return ValidationOutcome::ok();
    }
    let Some(text) = present(value) else {
        return ValidationOutcome::error("Tetting mangler");
    };
    if VALID_TETTING.contains(&text.trim()) {
        return ValidationOutcome::ok();
    }
    ValidationOutcome::error(format!(
        "Ugyldig tetting-verdi: '{}' (forventet: Ja/Nei eller True/False)",
        text
    ))
}

/// Optional, comma separated list of functions
pub fn validate_funksjon(value: Option<&PropertyValue>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::info("Funksjon ikke angitt (valgfritt)");
    };

    let unknown: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && !VALID_FUNKSJON.contains(token))
        .collect();

    if unknown.is_empty() {
        ValidationOutcome::ok()
    } else {
        ValidationOutcome::warning(format!("Ukjent funksjon: {}", unknown.join(", ")))
    }
}

pub fn validate_fase(value: Option<&PropertyValue>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::error("Fase mangler");
    };
    let fase = text.trim();
    if VALID_FASE.contains(&fase) {
        return ValidationOutcome::ok();
    }
    ValidationOutcome::error(format!(
        "Ugyldig fase: '{}' (forventet: Fase 1 eller Fase 2)",
        fase
    ))
}

pub fn validate_status(value: Option<&PropertyValue>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::error("Status mangler");
    };
    let status = text.trim();
    if VALID_STATUS.contains(&status) {
        return ValidationOutcome::ok();
    }
    ValidationOutcome::error(format!("Ugyldig status: '{}'", status))
}

/// Revision number: digits, or any finite number truncating to >= 0
///
/// Booleans coerce to 1 and 0 and are accepted.
pub fn validate_rev(value: Option<&PropertyValue>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::error("Revisjon mangler");
    };
    let rev = text.trim();

    if rev.bytes().all(|b| b.is_ascii_digit()) {
        return ValidationOutcome::ok();
    }

    let numeric = match value {
        Some(PropertyValue::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(v) => v.as_number().or_else(|| rev.parse::<f64>().ok()),
        None => None,
    };
    if let Some(n) = numeric.filter(|n| n.is_finite()) {
        if n.trunc() >= 0.0 {
            return ValidationOutcome::ok();
        }
    }

    ValidationOutcome::error(format!(
        "Ugyldig revisjonsnummer: '{}' (forventet: 0, 1, 2, ...)",
        text
    ))
}

/// Revision date in `DD.MM.YYYY`; only the shape is checked
pub fn validate_rev_dato(value: Option<&PropertyValue>) -> ValidationOutcome {
    let Some(text) = present(value) else {
        return ValidationOutcome::error("Revisjonsdato mangler");
    };
    let date = text.trim();
    if DATE_PATTERN.is_match(date) {
        return ValidationOutcome::ok();
    }
    ValidationOutcome::error(format!(
        "Ugyldig datoformat: '{}' (forventet: DD.MM.YYYY)",
        date
    ))
}

pub fn validate_rev_beskrivelse(value: Option<&PropertyValue>) -> ValidationOutcome {
    match present(value) {
        Some(_) => ValidationOutcome::ok(),
        None => ValidationOutcome::error("Revisjonsbeskrivelse mangler"),
    }
}

/// Run the validator that belongs to `property`
///
/// Dimension properties have no single-value rule and pass trivially; they
/// are checked together by [`crate::dimensions::check_dimensions`].
pub fn validate_property(
    property: UtspProperty,
    value: Option<&PropertyValue>,
    expected_prefix: Option<&str>,
) -> ValidationOutcome {
    match property {
        UtspProperty::Kategori => validate_kategori(value),
        UtspProperty::Id => validate_id(value, expected_prefix),
        UtspProperty::Utsparingstype => validate_utsparingstype(value),
        UtspProperty::Tetting => validate_tetting(value),
        UtspProperty::Funksjon => validate_funksjon(value),
        UtspProperty::Fase => validate_fase(value),
        UtspProperty::Status => validate_status(value),
        UtspProperty::Rev => validate_rev(value),
        UtspProperty::RevDato => validate_rev_dato(value),
        UtspProperty::RevBeskrivelse => validate_rev_beskrivelse(value),
        UtspProperty::DimBredde
        | UtspProperty::DimHoyde
        | UtspProperty::DimDybde
        | UtspProperty::DimDiameter => ValidationOutcome::ok(),
    }
}
