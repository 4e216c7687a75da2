#![allow(dead_code)]

use std::error::Error;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::{dictionary, Document, Object};

pub fn cli(dir: &Path) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("printkiosk")?;
    cmd.current_dir(dir).env_remove("RUST_LOG");
    Ok(cmd)
}

pub fn write_pdf(path: &Path, pages: u32) -> Result<(), Box<dyn Error>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn write_png(path: &Path, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
    let mut bytes = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Writes a config pointing uploads and spool at `root` and returns its path.
pub fn write_config(root: &Path, extra: &str) -> Result<PathBuf, Box<dyn Error>> {
    let uploads = root.join("uploads");
    let spool = root.join("spool");
    let config = format!(
        r#"{{
            "storage": {{ "uploads_dir": {uploads}, "spool_dir": {spool} {extra} }},
            "checkout": {{ "inter_job_delay_ms": 0 }}
        }}"#,
        uploads = serde_json::to_string(&uploads)?,
        spool = serde_json::to_string(&spool)?,
    );
    let path = root.join("kiosk.json");
    fs::write(&path, config)?;
    Ok(path)
}
