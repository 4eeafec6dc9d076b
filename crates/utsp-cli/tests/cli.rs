// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("utsp").unwrap();
    cmd.env_remove("UTSP_OUTPUT_DIR").env("RUST_LOG", "warn");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn outputs(dir: &Path, extension: &str) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == extension))
        .collect()
}

#[test]
fn validate_writes_all_reports() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg("validate")
        .arg(fixture("A4_RIV_Utsparinger.ifc"))
        .arg("-o")
        .arg(out.path())
        .assert()
        .success()
        .stdout(contains("Validerer: A4_RIV_Utsparinger.ifc"))
        .stdout(contains("Forventet ID-prefiks: RIV"))
        .stdout(contains("Antall elementer: 2"))
        .stdout(contains("Mangler pset: 1"));

    let annotated = out.path().join("A4_RIV_Utsparinger_validert.ifc");
    let content = fs::read_to_string(&annotated).unwrap();
    assert_eq!(content.matches("'NOSKI_Validering'").count(), 2);
    assert!(!content.contains("IFCSTYLEDITEM"));

    assert_eq!(outputs(out.path(), "xlsx").len(), 1);
    let html = outputs(out.path(), "html");
    assert_eq!(html.len(), 1);
    let name = html[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("A4_Utsp_validering_"), "{}", name);
}

#[test]
fn validate_directory_respects_skip_flags() {
    let input = TempDir::new().unwrap();
    fs::copy(fixture("A4_RIV_Utsparinger.ifc"), input.path().join("A4_RIE_Hull.IFC")).unwrap();
    fs::write(input.path().join("les_meg.txt"), "ikke IFC").unwrap();
    let out = TempDir::new().unwrap();

    cmd()
        .args(["validate", "--no-excel", "--no-ifc"])
        .arg(input.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .success()
        .stdout(contains("Validerer: A4_RIE_Hull.IFC"))
        .stdout(contains("Forventet ID-prefiks: RIE"))
        .stdout(contains("Advarsler:    1"));

    assert!(outputs(out.path(), "xlsx").is_empty());
    assert!(outputs(out.path(), "ifc").is_empty());
    assert_eq!(outputs(out.path(), "html").len(), 1);
}

#[test]
fn colorize_without_geometry_adds_no_styles() {
    let out = TempDir::new().unwrap();
    cmd()
        .args(["validate", "--colorize", "--no-excel", "--no-html"])
        .arg(fixture("A4_RIV_Utsparinger.ifc"))
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();

    // The fixture has no shape representations, so nothing is styled
    let content = fs::read_to_string(out.path().join("A4_RIV_Utsparinger_validert.ifc")).unwrap();
    assert!(!content.contains("IFCSURFACESTYLE("));
    assert!(content.contains("Valideringsstatus"));
}

#[test]
fn no_inputs_found() {
    let empty = TempDir::new().unwrap();
    let out = empty.path().join("out");
    cmd()
        .arg("validate")
        .arg(empty.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Ingen IFC-filer funnet!"));
    assert!(!out.exists());
}

#[test]
fn unreadable_file_fails_but_others_are_reported() {
    let out = TempDir::new().unwrap();
    cmd()
        .arg("validate")
        .arg(fixture("broken.ifc"))
        .arg(fixture("A4_RIV_Utsparinger.ifc"))
        .arg("-o")
        .arg(out.path())
        .arg("--no-ifc")
        .assert()
        .failure()
        .stdout(contains("Validerer: A4_RIV_Utsparinger.ifc"))
        .stderr(contains("broken.ifc"))
        .stderr(contains("1 fil(er) kunne ikke leses"));

    assert_eq!(outputs(out.path(), "xlsx").len(), 1);
}

#[test]
fn annotated_write_failure_fails_the_run() {
    let out = TempDir::new().unwrap();
    fs::create_dir(out.path().join("A4_RIV_Utsparinger_validert.ifc")).unwrap();
    cmd()
        .args(["validate", "--no-excel", "--no-html"])
        .arg(fixture("A4_RIV_Utsparinger.ifc"))
        .arg("-o")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(contains("Kunne ikke skrive"));
}

#[test]
fn output_dir_from_environment() {
    let out = TempDir::new().unwrap();
    cmd()
        .env("UTSP_OUTPUT_DIR", out.path())
        .args(["validate", "--no-html", "--no-excel"])
        .arg(fixture("A4_RIV_Utsparinger.ifc"))
        .assert()
        .success();
    assert!(out.path().join("A4_RIV_Utsparinger_validert.ifc").exists());
}

#[test]
fn missing_arguments() {
    cmd()
        .arg("validate")
        .assert()
        .failure()
        .stderr(contains("INPUTS").or(contains("required")));
}
