// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `utsp validate`: validate files from disk and write reports next to each other

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use log::{info, warn};
use utsp_parser::ParsedModel;
use utsp_report::{annotate_to_path, write_excel, AnnotateOptions, ExcelLayout, HtmlReport};
use utsp_rules::{validate_model, FileRecord, FileSummary, ValidationConfig};

use crate::cli::ValidateArgs;

fn is_ifc(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ifc"))
}

/// IFC files named by the arguments
///
/// Directories are listed (not recursively) and sorted; other paths are kept
/// when they carry the `.ifc` extension.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("Kunne ikke lese mappen {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_ifc(path))
                .collect();
            found.sort();
            files.extend(found);
        } else if is_ifc(input) {
            files.push(input.clone());
        } else {
            warn!("Skipping {}: not an IFC file", input.display());
        }
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(summary: &FileSummary) {
    println!("  Antall elementer: {}", summary.total);
    println!("    OK:           {}", summary.ok);
    println!("    Feil:         {}", summary.feil);
    println!("    Advarsler:    {}", summary.advarsel);
    println!("    Mangler pset: {}", summary.mangler_pset);
}

/// Load and validate one file
fn validate_file(path: &Path, config: &ValidationConfig) -> Result<(ParsedModel, FileRecord)> {
    let filename = file_name(path);
    println!("\nValiderer: {}", filename);

    let model = ParsedModel::open(path).with_context(|| format!("Kunne ikke lese {}", path.display()))?;
    let record = validate_model(&model, &filename, config);

    println!(
        "  Forventet ID-prefiks: {}",
        record.expected_prefix.as_deref().unwrap_or("(ikke detektert)")
    );
    print_summary(record.summary());
    Ok((model, record))
}

/// Write `<stem>_validert.ifc` into the output directory
fn export_file(path: &Path, model: &ParsedModel, record: &FileRecord, args: &ValidateArgs) -> Result<()> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name(path));
    let target = args.output.join(format!("{}_validert.ifc", stem));
    let options = AnnotateOptions::new().with_colors(args.colorize);
    let updated = annotate_to_path(model, record, &options, &target)
        .with_context(|| format!("Kunne ikke skrive {}", target.display()))?;
    println!("  Oppdatert {} elementer: {}", updated, target.display());
    Ok(())
}

pub fn run(args: &ValidateArgs) -> Result<ExitCode> {
    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        println!("Ingen IFC-filer funnet!");
        return Ok(ExitCode::SUCCESS);
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Kunne ikke opprette {}", args.output.display()))?;

    let config = args.rules.config();
    info!("Validating {} files into {}", files.len(), args.output.display());

    let mut records = Vec::with_capacity(files.len());
    let mut failed = 0usize;
    for path in &files {
        let (model, record) = match validate_file(path, &config) {
            Ok(loaded) => loaded,
            Err(e) => {
                failed += 1;
                warn!("{:#}", e);
                eprintln!("  FEIL: {:#}", e);
                continue;
            }
        };
        // Unlike unreadable inputs, a failed write ends the run
        if !args.no_ifc {
            export_file(path, &model, &record, args)?;
        }
        drop(model);
        records.push(record);
    }

    if !records.is_empty() {
        let stamp = Local::now().format("%Y%m%d_%H%M");
        let base = args.output.join(format!("A4_Utsp_validering_{}", stamp));

        if !args.no_excel {
            let path = base.with_extension("xlsx");
            write_excel(&records, ExcelLayout::PerFile, &path)
                .with_context(|| format!("Kunne ikke skrive {}", path.display()))?;
            println!("\nExcel-rapport: {}", path.display());
        }
        if !args.no_html {
            let path = base.with_extension("html");
            HtmlReport::new(&records)
                .write_to(&path)
                .with_context(|| format!("Kunne ikke skrive {}", path.display()))?;
            println!("HTML-rapport: {}", path.display());
        }
    }

    let total = records
        .iter()
        .fold(FileSummary::default(), |acc, r| acc.merge(r.summary()));
    println!(
        "\nTotalt: {} filer, {} elementer, {} OK, {} feil, {} advarsler, {} mangler pset",
        records.len(),
        total.total,
        total.ok,
        total.feil,
        total.advarsel,
        total.mangler_pset
    );

    if failed > 0 {
        eprintln!("{} fil(er) kunne ikke leses", failed);
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
