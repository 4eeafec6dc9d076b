// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standalone interactive HTML report
//!
//! The page is a fixed template; all per-element data is embedded as one
//! JSON literal and rendered client-side.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Local};
use log::info;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use utsp_rules::{
    ElementRecord, ElementStatus, FileRecord, FileSummary, PropertyMap, PsetLocation, Severity,
    UtspProperty, ValidationOutcome,
};

use crate::error::Result;
use crate::messages::ElementMessages;

const TEMPLATE: &str = include_str!("report.html");

/// Property values as display text, in extraction order
struct PropertyTexts<'a>(&'a PropertyMap);

impl Serialize for PropertyTexts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.iter() {
            let text = value.map(|v| v.as_text()).unwrap_or_default();
            map.serialize_entry(name, &text)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct Check<'a> {
    valid: bool,
    message: &'a str,
    severity: Severity,
}

impl<'a> From<&'a ValidationOutcome> for Check<'a> {
    fn from(outcome: &'a ValidationOutcome) -> Self {
        Self {
            valid: outcome.passed,
            message: &outcome.message,
            severity: outcome.severity,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ElementPayload<'a> {
    guid: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    ifc_type: &'a str,
    object_type: &'a str,
    status: ElementStatus,
    has_pset: bool,
    pset_found: Option<String>,
    all_psets: &'a [String],
    error_count: usize,
    warning_count: usize,
    error_messages: Vec<String>,
    properties: PropertyTexts<'a>,
    validations: BTreeMap<UtspProperty, Check<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension_validation: Option<Check<'a>>,
}

impl<'a> From<&'a ElementRecord> for ElementPayload<'a> {
    fn from(element: &'a ElementRecord) -> Self {
        Self {
            guid: &element.identity.global_id,
            name: &element.identity.name,
            ifc_type: &element.identity.ifc_type,
            object_type: element.identity.object_type.as_deref().unwrap_or("-"),
            status: element.status,
            has_pset: element.has_pset(),
            pset_found: element.location.label(),
            all_psets: &element.all_psets,
            error_count: element.error_count,
            warning_count: element.warning_count,
            error_messages: ElementMessages::of(element).lines(),
            properties: PropertyTexts(&element.properties),
            validations: element
                .validations
                .iter()
                .map(|(property, outcome)| (*property, Check::from(outcome)))
                .collect(),
            dimension_validation: element.dimension.as_ref().map(|d| Check::from(&d.outcome)),
        }
    }
}

/// Whether a file carries the property set at all, for the overview tiles
#[derive(Debug, PartialEq, Serialize)]
pub struct PsetTile {
    /// `ok`, `warning` or `error`
    pub level: &'static str,
    pub label: String,
    pub note: Option<&'static str>,
}

impl PsetTile {
    pub fn of(file: &FileRecord) -> Self {
        if file.elements().iter().any(ElementRecord::has_pset) {
            return Self {
                level: "ok",
                label: utsp_rules::REQUIRED_PSET.to_string(),
                note: None,
            };
        }
        let misplaced = file.elements().iter().find_map(|e| match &e.location {
            PsetLocation::Misplaced(name) => Some(name.clone()),
            _ => None,
        });
        match misplaced {
            Some(name) => Self {
                level: "warning",
                label: name,
                note: Some("Feil pset-navn"),
            },
            None => Self {
                level: "error",
                label: "Ikke funnet".to_string(),
                note: None,
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilePayload<'a> {
    filename: &'a str,
    summary: &'a FileSummary,
    pset_status: PsetTile,
    elements: Vec<ElementPayload<'a>>,
}

#[derive(Serialize)]
struct ReportPayload<'a> {
    generated: String,
    files: Vec<FilePayload<'a>>,
}

/// JSON that can sit inside a `<script>` element
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    // '<', '>' and '&' only occur inside JSON strings, where escapes are valid
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Builder for the HTML report
pub struct HtmlReport<'a> {
    files: &'a [FileRecord],
    generated: DateTime<Local>,
    banner: String,
}

impl<'a> HtmlReport<'a> {
    pub fn new(files: &'a [FileRecord]) -> Self {
        Self {
            files,
            generated: Local::now(),
            banner: String::new(),
        }
    }

    /// Fix the timestamp shown in the header
    pub fn generated_at(mut self, generated: DateTime<Local>) -> Self {
        self.generated = generated;
        self
    }

    /// Trusted HTML placed above the summary (download links and the like)
    pub fn with_banner(mut self, html: impl Into<String>) -> Self {
        self.banner = html.into();
        self
    }

    pub fn render(&self) -> Result<String> {
        let generated = self.generated.format("%Y-%m-%d %H:%M").to_string();
        let payload = ReportPayload {
            generated: generated.clone(),
            files: self
                .files
                .iter()
                .map(|file| FilePayload {
                    filename: &file.filename,
                    summary: file.summary(),
                    pset_status: PsetTile::of(file),
                    elements: file.elements().iter().map(ElementPayload::from).collect(),
                })
                .collect(),
        };

        let data = script_json(&payload)?;
        Ok(fill_template(
            TEMPLATE,
            &[
                ("__BANNER__", self.banner.as_str()),
                ("__GENERATED__", generated.as_str()),
                ("__REPORT_DATA__", data.as_str()),
            ],
        ))
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render()?)?;
        info!("HTML report written to {}", path.display());
        Ok(())
    }
}

/// Substitute placeholders in one pass; inserted values are never rescanned
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|&(key, value)| rest.find(key).map(|at| (at, key, value)))
            .min_by_key(|&(at, _, _)| at);
        let Some((at, key, value)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + key.len()..];
    }
}

/// Render the report for `files` with the current time
pub fn html_report(files: &[FileRecord]) -> Result<String> {
    HtmlReport::new(files).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::fixtures::{element, mixed_file, pset, VALID};
    use chrono::TimeZone;

    fn embedded_json(html: &str) -> serde_json::Value {
        let start = html.find("const data = ").unwrap() + "const data = ".len();
        let end = start + html[start..].find(";\n").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let files = [mixed_file("A4_RIV.ifc")];
        let html = HtmlReport::new(&files).render().unwrap();
        let data = embedded_json(&html);

        let file = &data["files"][0];
        assert_eq!(file["filename"], "A4_RIV.ifc");
        assert_eq!(file["summary"]["total"], 4);
        assert_eq!(file["summary"]["mangler_pset"], 1);
        assert_eq!(file["summary"]["has_pset"], 2);
        assert_eq!(file["pset_status"], serde_json::Value::Null);
        assert_eq!(file["psetStatus"]["level"], "ok");

        let ok = &file["elements"][0];
        assert_eq!(ok["guid"], "guid-1");
        assert_eq!(ok["type"], "IfcBuildingElementProxy");
        assert_eq!(ok["objectType"], "-");
        assert_eq!(ok["status"], "OK");
        assert_eq!(ok["hasPset"], true);
        assert_eq!(ok["psetFound"], "A4_Utsp");
        assert_eq!(ok["properties"]["A4_Utsp_ID"], "RIV_Hull-1");
        assert_eq!(ok["validations"]["A4_Utsp_Kategori"]["valid"], true);
        assert_eq!(ok["validations"]["A4_Utsp_Kategori"]["severity"], "error");
        assert_eq!(ok["dimensionValidation"]["message"], "Rektangulær: Bredde og Høyde angitt");
        assert!(ok["errorMessages"].as_array().unwrap().is_empty());

        let misplaced = &file["elements"][2];
        assert_eq!(misplaced["psetFound"], "Utsparing (feil plassering)");
        assert_eq!(
            misplaced["errorMessages"][0],
            "ADVARSEL: Egenskaper i feil pset: Utsparing (feil plassering)"
        );

        let missing = &file["elements"][3];
        assert_eq!(missing["status"], "Mangler pset");
        assert_eq!(missing["psetFound"], serde_json::Value::Null);
        assert!(missing.get("dimensionValidation").is_none());
        assert_eq!(missing["allPsets"][0], "Pset_ProxyCommon");
    }

    #[test]
    fn test_script_safe_embedding() {
        let record = element(
            1,
            "</script><script>alert(1)</script>",
            &[pset("A4_Utsp", VALID)],
        );
        let files = [FileRecord::new("a&b.ifc", None, vec![record])];
        let html = html_report(&files).unwrap();
        assert!(!html.contains("</script><script>"));
        let data = embedded_json(&html);
        assert_eq!(data["files"][0]["elements"][0]["name"], "</script><script>alert(1)</script>");
        assert_eq!(data["files"][0]["filename"], "a&b.ifc");
    }

    #[test]
    fn test_header_and_banner() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let html = HtmlReport::new(&[])
            .generated_at(at)
            .with_banner("<div class=\"banner\">Nedlastinger</div>")
            .render()
            .unwrap();
        assert!(html.contains("Generert: 2024-03-05 14:07"));
        assert!(html.contains("<div class=\"banner\">Nedlastinger</div>"));
        assert!(!html.contains("__REPORT_DATA__"));
        assert_eq!(embedded_json(&html)["generated"], "2024-03-05 14:07");
    }

    #[test]
    fn test_placeholders_in_values_are_left_alone() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let files = [mixed_file("__BANNER__.ifc")];
        let html = HtmlReport::new(&files)
            .generated_at(at)
            .with_banner("<p>__REPORT_DATA__ __GENERATED__</p>")
            .render()
            .unwrap();
        assert!(html.contains("<p>__REPORT_DATA__ __GENERATED__</p>"));
        assert_eq!(embedded_json(&html)["files"][0]["filename"], "__BANNER__.ifc");
        assert_eq!(embedded_json(&html)["generated"], "2024-03-05 14:07");
    }

    #[test]
    fn test_fill_template() {
        let filled = fill_template("a {x} b {y} c {x}", &[("{x}", "{y}"), ("{y}", "Y")]);
        assert_eq!(filled, "a {y} b Y c {y}");
    }

    #[test]
    fn test_pset_tiles() {
        assert_eq!(PsetTile::of(&mixed_file("a.ifc")).level, "ok");

        let misplaced = FileRecord::new(
            "b.ifc",
            None,
            vec![
                element(1, "x", &[pset("Pset_ProxyCommon", &[])]),
                element(2, "y", &[pset("Egne", VALID)]),
            ],
        );
        let tile = PsetTile::of(&misplaced);
        assert_eq!(tile.level, "warning");
        assert_eq!(tile.label, "Egne");
        assert_eq!(tile.note, Some("Feil pset-navn"));

        let none = FileRecord::new("c.ifc", None, vec![element(1, "x", &[])]);
        assert_eq!(PsetTile::of(&none).label, "Ikke funnet");
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rapport.html");
        HtmlReport::new(&[mixed_file("a.ifc")]).write_to(&path).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
