mod common;

use std::error::Error;
use std::fs;

use predicates::prelude::*;
use tempfile::tempdir;

use common::{cli, write_config, write_pdf, write_png};

#[test]
fn checkout_prints_order_into_spool() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config = write_config(dir.path(), "")?;
    let session = dir.path().join("uploads").join("SunnyOtter42");
    fs::create_dir_all(&session)?;
    write_png(&session.join("photo.png"), 1200, 800)?;
    write_pdf(&session.join("thesis.pdf"), 4)?;

    let order = dir.path().join("order.json");
    fs::write(
        &order,
        r#"{
            "session": "SunnyOtter42",
            "mobile": "98765 43210",
            "canvas": [
                { "items": [ { "file": "photo.png", "x": 200, "y": 200, "quarter_turns": 1 } ] },
                { "color_mode": "bw" }
            ],
            "documents": [
                { "file": "thesis.pdf", "settings": { "page_range": { "custom": "1-2" } } }
            ],
            "paper": [ { "product": "a4-plain", "quantity": 2 } ]
        }"#,
    )?;

    cli(dir.path())?
        .args([
            "--config",
            config.to_str().unwrap(),
            "checkout",
            order.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(
                "Order total: 16 INR (1 canvas pages, 1 documents, 1 paper lines)",
            )
            .and(predicate::str::contains("Payment ID: counter_"))
            .and(predicate::str::contains("All 2 print jobs completed.")),
        );

    let mut tickets: Vec<_> = fs::read_dir(dir.path().join("spool"))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    tickets.sort();
    assert_eq!(tickets.len(), 2);
    let page: serde_json::Value = serde_json::from_slice(&fs::read(&tickets[0])?)?;
    assert_eq!(page["kind"], "composed_page");
    assert_eq!(page["items"][0]["rotation"], 90);
    let document: serde_json::Value = serde_json::from_slice(&fs::read(&tickets[1])?)?;
    assert_eq!(document["kind"], "document");
    assert_eq!(document["pages"], serde_json::json!([1, 2]));
    Ok(())
}

#[test]
fn checkout_of_empty_order_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config = write_config(dir.path(), "")?;
    let order = dir.path().join("order.json");
    fs::write(&order, r#"{ "session": "QuietOwl11" }"#)?;

    cli(dir.path())?
        .args([
            "--config",
            config.to_str().unwrap(),
            "checkout",
            order.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: the order is empty"));
    assert!(!dir.path().join("spool").exists());
    Ok(())
}

#[test]
fn checkout_reports_missing_upload() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config = write_config(dir.path(), "")?;
    let order = dir.path().join("order.json");
    fs::write(
        &order,
        r#"{ "session": "QuietOwl11", "documents": [ { "file": "ghost.pdf" } ] }"#,
    )?;

    cli(dir.path())?
        .args([
            "--config",
            config.to_str().unwrap(),
            "checkout",
            order.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open document"));
    Ok(())
}
