mod common;

use std::error::Error;
use std::fs;

use predicates::prelude::*;
use tempfile::tempdir;

use common::cli;

#[test]
fn config_import_and_export() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config_path = dir.path().join("kiosk.json");
    let import_path = dir.path().join("incoming.json");
    fs::write(
        &import_path,
        r#"{
            "tariff": { "color_per_side": 12 },
            "checkout": { "currency": "usd", "shop_name": "Library Prints" }
        }"#,
    )?;

    cli(dir.path())?
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "config",
            "import",
            import_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported configuration"));

    cli(dir.path())?
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "quote",
            "--pages",
            "3",
            "--color",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cost: 36 USD"));

    let export_path = dir.path().join("out/exported.json");
    cli(dir.path())?
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "config",
            "export",
            "--output",
            export_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let exported = fs::read_to_string(export_path)?;
    assert!(exported.contains("\"shop_name\": \"Library Prints\""));
    assert!(exported.contains("\"bw_per_side\": 2"));
    Ok(())
}

#[test]
fn config_show_prints_defaults_without_a_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"currency\": \"INR\"")
                .and(predicate::str::contains("\"inter_job_delay_ms\": 2000")),
        );
    assert!(!dir.path().join("printkiosk.json").exists());
    Ok(())
}

#[test]
fn malformed_config_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("printkiosk.json"), "{ nope")?;
    cli(dir.path())?
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
    Ok(())
}
