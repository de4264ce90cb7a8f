//! ZIP export of a finished batch.
//!
//! The archive holds `summary.json` with the consolidated table and one
//! `layouts/<sku>.json` per accepted SKU carrying its placements.

use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch::BatchReport;
use crate::records::{BatchSummary, SkuLayoutRecord};

pub const SUMMARY_FILE: &str = "summary.json";
pub const LAYOUT_DIR: &str = "layouts";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the archive for `report` and hands the writer back.
pub fn write_archive<W: Write + Seek>(report: &BatchReport, writer: W) -> Result<W, ExportError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(SUMMARY_FILE, options)?;
    serde_json::to_writer_pretty(&mut zip, &BatchSummary::from_report(report))?;

    let mut used_names = HashSet::new();
    for result in &report.results {
        let name = unique_name(&file_stem(&result.item.sku), &mut used_names);
        zip.start_file(format!("{LAYOUT_DIR}/{name}.json"), options)?;
        serde_json::to_writer_pretty(&mut zip, &SkuLayoutRecord::from_result(result))?;
    }

    Ok(zip.finish()?)
}

/// Builds the archive in memory.
pub fn archive_bytes(report: &BatchReport) -> Result<Vec<u8>, ExportError> {
    Ok(write_archive(report, Cursor::new(Vec::new()))?.into_inner())
}

/// Reduces a SKU to characters that are safe in archive paths.
fn file_stem(sku: &str) -> String {
    let stem: String = sku
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "sku".to_string()
    } else {
        stem.to_string()
    }
}

fn unique_name(stem: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = stem.to_string();
    let mut suffix = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{stem}_{suffix}");
        suffix += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use std::io::{Read, SeekFrom};

    use super::*;
    use crate::batch::pack_items;
    use crate::model::{Item, Pallet, Shape};
    use crate::optimizer::PackingConfig;

    fn report() -> BatchReport {
        let items = vec![
            Item::new("CJ 01/A", Shape::Box, (30.0, 20.0, 15.0), 5.0),
            Item::new("CJ 01/A", Shape::Box, (40.0, 30.0, 20.0), 9.0),
            Item::new("TOO-LONG", Shape::Box, (200.0, 30.0, 20.0), 9.0),
        ];
        pack_items(&Pallet::default(), items, &PackingConfig::default())
    }

    fn read_entry<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> String {
        let mut content = String::new();
        archive
            .by_name(name)
            .expect("entry missing")
            .read_to_string(&mut content)
            .expect("entry unreadable");
        content
    }

    #[test]
    fn archive_contains_summary_and_one_layout_per_accepted_sku() {
        let bytes = archive_bytes(&report()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["layouts/CJ_01_A.json", "layouts/CJ_01_A_2.json", "summary.json"]
        );

        let summary: serde_json::Value =
            serde_json::from_str(&read_entry(&mut archive, SUMMARY_FILE)).unwrap();
        assert_eq!(summary["results"].as_array().map(Vec::len), Some(2));
        assert_eq!(summary["rejected"][0]["sku"], "TOO-LONG");
        assert_eq!(summary["pallet"]["max_weight"], 1250.0);

        let layout: serde_json::Value =
            serde_json::from_str(&read_entry(&mut archive, "layouts/CJ_01_A.json")).unwrap();
        assert_eq!(layout["summary"]["total_items"], 140);
        assert_eq!(layout["placements"].as_array().map(Vec::len), Some(140));
    }

    #[test]
    fn archive_can_be_written_to_a_file() {
        let file = tempfile::tempfile().unwrap();
        let mut file = write_archive(&report(), file).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn file_stems_are_sanitised() {
        assert_eq!(file_stem("A/B\\C"), "A_B_C");
        assert_eq!(file_stem("  "), "sku");
        assert_eq!(file_stem("../etc"), "_etc");
        assert_eq!(file_stem("SKU-1.v2"), "SKU-1.v2");
    }
}
