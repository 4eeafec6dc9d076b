// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spreadsheet report
//!
//! Two layouts share the same cell helpers: [`ExcelLayout::PerFile`] writes
//! an overview sheet, one details sheet per file and an error list, while
//! [`ExcelLayout::Combined`] puts the overview and all details on a single
//! `Rapport` sheet.

use std::path::Path;

use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use utsp_model::PropertyValue;
use utsp_rules::{FileRecord, FileSummary, Severity, UtspProperty};

use crate::error::Result;
use crate::messages::{join_or_dash, ElementMessages};

const MAX_COLUMN_WIDTH: usize = 50;
/// Leaves room for a ` (n)` suffix within Excel's 31 character limit
const SHEET_NAME_LEN: usize = 28;
const EXCEL_NAME_LIMIT: usize = 31;

const OVERVIEW_SHEET: &str = "Oversikt";
const ISSUES_SHEET: &str = "Feil og advarsler";
const COMBINED_SHEET: &str = "Rapport";

/// Sheet arrangement of the workbook
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExcelLayout {
    /// Overview, one sheet per file, error list (batch runs)
    #[default]
    PerFile,
    /// Overview and all details on one sheet (interactive downloads)
    Combined,
}

#[derive(Clone, Debug, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    fn property(value: Option<&PropertyValue>) -> Self {
        match value {
            Some(PropertyValue::Text(s)) => Cell::Text(s.clone()),
            Some(PropertyValue::Integer(i)) => Cell::Number(*i as f64),
            Some(PropertyValue::Real(f)) => Cell::Number(*f),
            Some(PropertyValue::Bool(b)) => Cell::Bool(*b),
            None => Cell::Empty,
        }
    }

    fn width(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
            Cell::Bool(true) => 4,
            Cell::Bool(false) => 5,
            Cell::Empty => 0,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

/// Header row plus data rows
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    fn new<S: ToString>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

/// Column width fitted to the longest cell, capped
fn fitted_width(longest: usize) -> usize {
    (longest + 2).min(MAX_COLUMN_WIDTH)
}

/// Writes tables top to bottom and tracks the widest cell per column
struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    header: &'a Format,
    row: u32,
    widths: Vec<usize>,
}

impl<'a> SheetWriter<'a> {
    fn new(sheet: &'a mut Worksheet, header: &'a Format) -> Self {
        Self {
            sheet,
            header,
            row: 0,
            widths: Vec::new(),
        }
    }

    fn track(&mut self, col: usize, width: usize) {
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        self.widths[col] = self.widths[col].max(width);
    }

    fn table(&mut self, table: &Table) -> Result<()> {
        for (col, title) in table.headers.iter().enumerate() {
            self.sheet
                .write_string_with_format(self.row, col as u16, title, self.header)?;
            self.track(col, title.chars().count());
        }
        self.row += 1;

        for cells in &table.rows {
            for (col, cell) in cells.iter().enumerate() {
                let c = col as u16;
                match cell {
                    Cell::Text(s) => {
                        self.sheet.write_string(self.row, c, s)?;
                    }
                    Cell::Number(n) => {
                        self.sheet.write_number(self.row, c, *n)?;
                    }
                    Cell::Bool(b) => {
                        self.sheet.write_boolean(self.row, c, *b)?;
                    }
                    Cell::Empty => {}
                }
                self.track(col, cell.width());
            }
            self.row += 1;
        }
        Ok(())
    }

    fn skip(&mut self, rows: u32) {
        self.row += rows;
    }

    fn finish(self) -> Result<()> {
        for (col, longest) in self.widths.iter().enumerate() {
            self.sheet
                .set_column_width(col as u16, fitted_width(*longest) as f64)?;
        }
        Ok(())
    }
}

fn is_taken(name: &str, taken: &[String]) -> bool {
    let lower = name.to_lowercase();
    taken.iter().any(|t| t.to_lowercase() == lower)
}

/// Excel-safe sheet name, unique within `taken` (compared case-insensitively)
fn sheet_name(filename: &str, taken: &mut Vec<String>) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base = if cleaned.is_empty() { "Fil" } else { cleaned };

    let mut name = base.to_string();
    let mut n = 2;
    while is_taken(&name, taken) {
        let suffix = format!(" ({})", n);
        let keep = EXCEL_NAME_LIMIT.saturating_sub(suffix.chars().count());
        name = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    taken.push(name.clone());
    name
}

fn coverage_text(summary: &FileSummary) -> String {
    if summary.total == 0 {
        "0%".to_string()
    } else {
        format!("{:.1}%", summary.coverage())
    }
}

/// Required and dimension properties, in column order
fn detail_properties() -> impl Iterator<Item = UtspProperty> {
    UtspProperty::REQUIRED
        .iter()
        .chain(UtspProperty::DIMENSIONS)
        .copied()
}

fn overview_table(files: &[FileRecord]) -> Table {
    let mut table = Table::new([
        "Fil",
        "Totalt",
        "OK",
        "Feil",
        "Advarsler",
        "Mangler pset",
        "Har A4_Utsp",
        "Dekningsgrad A4_Utsp",
        "Totalt antall feil",
        "Totalt antall advarsler",
    ]);
    for file in files {
        let s = file.summary();
        table.push(vec![
            file.filename.as_str().into(),
            s.total.into(),
            s.ok.into(),
            s.feil.into(),
            s.advarsel.into(),
            s.mangler_pset.into(),
            s.has_pset.into(),
            coverage_text(s).into(),
            s.total_errors.into(),
            s.total_warnings.into(),
        ]);
    }
    table
}

fn file_details_table(file: &FileRecord) -> Table {
    let mut headers: Vec<String> = [
        "GUID",
        "Navn",
        "ObjectType",
        "IFC-type",
        "Status",
        "Feilmeldinger",
        "Har A4_Utsp",
        "Pset funnet",
        "Tilgjengelige psets",
        "Antall feil",
        "Antall advarsler",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    for property in detail_properties() {
        headers.push(property.name().to_string());
        headers.push(format!("{}_sjekk", property.name()));
    }
    headers.push("Dimensjon_sjekk".to_string());

    let mut table = Table::new(headers);
    for element in file.elements() {
        let id = &element.identity;
        let mut row: Vec<Cell> = vec![
            id.global_id.as_str().into(),
            id.name.as_str().into(),
            id.object_type.as_deref().unwrap_or("-").into(),
            id.ifc_type.as_str().into(),
            element.status.label().into(),
            ElementMessages::of(element).summary().into(),
            if element.has_pset() { "Ja" } else { "Nei" }.into(),
            element.location.to_string().into(),
            join_or_dash(&element.all_psets).into(),
            element.error_count.into(),
            element.warning_count.into(),
        ];
        for property in detail_properties() {
            row.push(Cell::property(element.properties.value(property.name())));
            row.push(
                element
                    .outcome(property)
                    .map(|o| o.message.as_str())
                    .unwrap_or("-")
                    .into(),
            );
        }
        row.push(
            element
                .dimension
                .as_ref()
                .map(|d| d.outcome.message.as_str())
                .unwrap_or("-")
                .into(),
        );
        table.push(row);
    }
    table
}

fn issues_table(files: &[FileRecord]) -> Table {
    let mut table = Table::new([
        "Fil",
        "GUID",
        "Navn",
        "Egenskap",
        "Verdi",
        "Melding",
        "Alvorlighet",
    ]);
    for file in files {
        for element in file.elements() {
            if element.error_count == 0 && element.warning_count == 0 {
                continue;
            }
            for (property, outcome) in &element.validations {
                if outcome.passed && outcome.severity != Severity::Warning {
                    continue;
                }
                let value = element
                    .properties
                    .value(property.name())
                    .map(PropertyValue::as_text)
                    .unwrap_or_default();
                let severity = if outcome.severity == Severity::Error {
                    "Feil"
                } else {
                    "Advarsel"
                };
                table.push(vec![
                    file.filename.as_str().into(),
                    element.identity.global_id.as_str().into(),
                    element.identity.name.as_str().into(),
                    property.name().into(),
                    value.into(),
                    outcome.message.as_str().into(),
                    severity.into(),
                ]);
            }
            if let Some(dimension) = element.dimension.as_ref().filter(|d| !d.passed()) {
                table.push(vec![
                    file.filename.as_str().into(),
                    element.identity.global_id.as_str().into(),
                    element.identity.name.as_str().into(),
                    "Dimensjoner".into(),
                    "-".into(),
                    dimension.outcome.message.as_str().into(),
                    "Feil".into(),
                ]);
            }
        }
    }
    table
}

fn combined_overview_table(files: &[FileRecord]) -> Table {
    let mut table = Table::new([
        "Fil",
        "Totalt",
        "OK",
        "Feil",
        "Advarsler",
        "Mangler pset",
        "Dekningsgrad A4_Utsp",
    ]);
    for file in files {
        let s = file.summary();
        table.push(vec![
            file.filename.as_str().into(),
            s.total.into(),
            s.ok.into(),
            s.feil.into(),
            s.advarsel.into(),
            s.mangler_pset.into(),
            coverage_text(s).into(),
        ]);
    }
    table
}

fn combined_details_table(files: &[FileRecord]) -> Table {
    let mut headers: Vec<String> = [
        "Fil",
        "GUID",
        "Navn",
        "ObjectType",
        "Status",
        "Feilmeldinger",
        "Tilgjengelige psets",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    headers.extend(detail_properties().map(|p| p.name().to_string()));

    let mut table = Table::new(headers);
    for file in files {
        for element in file.elements() {
            let id = &element.identity;
            let mut row: Vec<Cell> = vec![
                file.filename.as_str().into(),
                id.global_id.as_str().into(),
                id.name.as_str().into(),
                id.object_type.as_deref().unwrap_or("-").into(),
                element.status.label().into(),
                ElementMessages::of(element).summary().into(),
                join_or_dash(&element.all_psets).into(),
            ];
            row.extend(
                detail_properties().map(|p| Cell::property(element.properties.value(p.name()))),
            );
            table.push(row);
        }
    }
    table
}

fn add_sheet<'w>(workbook: &'w mut Workbook, name: &str) -> Result<&'w mut Worksheet> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    Ok(sheet)
}

fn build_workbook(files: &[FileRecord], layout: ExcelLayout) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    match layout {
        ExcelLayout::PerFile => {
            let mut writer = SheetWriter::new(add_sheet(&mut workbook, OVERVIEW_SHEET)?, &header);
            writer.table(&overview_table(files))?;
            writer.finish()?;

            let mut taken = vec![OVERVIEW_SHEET.to_string(), ISSUES_SHEET.to_string()];
            for file in files {
                let name = sheet_name(&file.filename, &mut taken);
                let sheet = add_sheet(&mut workbook, &name)?;
                sheet.set_freeze_panes(1, 0)?;
                let mut writer = SheetWriter::new(sheet, &header);
                writer.table(&file_details_table(file))?;
                writer.finish()?;
            }

            let issues = issues_table(files);
            if !issues.rows.is_empty() {
                let mut writer = SheetWriter::new(add_sheet(&mut workbook, ISSUES_SHEET)?, &header);
                writer.table(&issues)?;
                writer.finish()?;
            }
        }
        ExcelLayout::Combined => {
            let mut writer = SheetWriter::new(add_sheet(&mut workbook, COMBINED_SHEET)?, &header);
            writer.table(&combined_overview_table(files))?;
            writer.skip(2);
            writer.table(&combined_details_table(files))?;
            writer.finish()?;
        }
    }

    Ok(workbook)
}

/// Write the workbook to `path`
pub fn write_excel(files: &[FileRecord], layout: ExcelLayout, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = build_workbook(files, layout)?;
    workbook.save(path)?;
    info!("Excel report written to {}", path.display());
    Ok(())
}

/// Build the workbook in memory
pub fn excel_to_buffer(files: &[FileRecord], layout: ExcelLayout) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(files, layout)?;
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::fixtures::mixed_file;

    #[test]
    fn test_sheet_names() {
        let mut taken = vec![OVERVIEW_SHEET.to_string(), ISSUES_SHEET.to_string()];
        assert_eq!(sheet_name("A4_RIV_Utsparinger.ifc", &mut taken), "A4_RIV_Utsparinger.ifc");
        assert_eq!(sheet_name("a4_riv_utsparinger.ifc", &mut taken), "a4_riv_utsparinger.ifc (2)");
        assert_eq!(sheet_name("plan[1]/b?.ifc", &mut taken), "plan_1__b_.ifc");
        assert_eq!(sheet_name("oversikt", &mut taken), "oversikt (2)");

        let long = "A4_RIVA_Utsparinger_Bygg_B_Etasje_3.ifc";
        let first = sheet_name(long, &mut taken);
        let second = sheet_name(long, &mut taken);
        assert_eq!(first.chars().count(), SHEET_NAME_LEN);
        let kept: String = first.chars().take(EXCEL_NAME_LIMIT - 4).collect();
        assert_eq!(second, format!("{} (2)", kept));
        assert!(second.chars().count() <= EXCEL_NAME_LIMIT);
        assert_eq!(sheet_name("''", &mut taken), "Fil");
    }

    #[test]
    fn test_fitted_width() {
        assert_eq!(fitted_width(0), 2);
        assert_eq!(fitted_width(10), 12);
        assert_eq!(fitted_width(48), 50);
        assert_eq!(fitted_width(400), 50);
    }

    #[test]
    fn test_overview_rows() {
        let file = mixed_file("A4_RIV.ifc");
        let table = overview_table(std::slice::from_ref(&file));
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row[1], Cell::Number(4.0));
        assert_eq!(row[6], Cell::Number(2.0));
        assert_eq!(row[7], Cell::Text("50.0%".into()));

        let empty = FileRecord::new("tom.ifc", None, Vec::new());
        assert_eq!(coverage_text(empty.summary()), "0%");
    }

    #[test]
    fn test_details_columns() {
        let table = file_details_table(&mixed_file("A4_RIV.ifc"));
        // 11 fixed, value + check per property, dimension check
        assert_eq!(table.headers.len(), 11 + 2 * 13 + 1);
        assert_eq!(table.rows.len(), 4);
        assert!(table.rows.iter().all(|r| r.len() == table.headers.len()));
        assert_eq!(table.headers[11], "A4_Utsp_Kategori");
        assert_eq!(table.headers[12], "A4_Utsp_Kategori_sjekk");

        let missing = &table.rows[3];
        assert_eq!(missing[4], Cell::Text("Mangler pset".into()));
        assert_eq!(missing[7], Cell::Text("-".into()));
        assert_eq!(missing[12], Cell::Text("-".into()));
        assert_eq!(missing[11], Cell::Empty);
    }

    #[test]
    fn test_issue_rows() {
        let table = issues_table(&[mixed_file("A4_RIV.ifc")]);
        // Fase 3 only; the misplaced set is not a property finding
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][3], Cell::Text("A4_Utsp_Fase".into()));
        assert_eq!(table.rows[0][4], Cell::Text("Fase 3".into()));
        assert_eq!(table.rows[0][6], Cell::Text("Feil".into()));
    }

    #[test]
    fn test_combined_details_span_files() {
        let files = [mixed_file("a.ifc"), mixed_file("b.ifc")];
        let table = combined_details_table(&files);
        assert_eq!(table.headers.len(), 7 + 13);
        assert_eq!(table.rows.len(), 8);
        assert_eq!(table.rows[4][0], Cell::Text("b.ifc".into()));
    }

    #[test]
    fn test_workbooks_build() {
        let files = [mixed_file("A4_RIV.ifc"), mixed_file("A4_RIE.ifc")];
        for layout in [ExcelLayout::PerFile, ExcelLayout::Combined] {
            let bytes = excel_to_buffer(&files, layout).unwrap();
            assert!(bytes.starts_with(b"PK"), "{:?}", layout);
        }
        assert!(excel_to_buffer(&[], ExcelLayout::PerFile).is_ok());
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rapport.xlsx");
        write_excel(&[mixed_file("A4_RIV.ifc")], ExcelLayout::PerFile, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
