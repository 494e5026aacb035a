//! # Source Module
//!
//! Loading of the two input snapshots. The API export is JSON; the sheet export
//! is CSV whose header row may be preceded by free-form preamble lines. Both
//! files are read concurrently and reconciliation starts only once both are in.

use crate::model::{ApiExport, SheetRow};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Marker identifying the sheet header row.
pub const SHEET_HEADER_MARKER: &str = "Project Name";

/// Both input documents, fully materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshots {
    pub api: ApiExport,
    pub sheet: Vec<SheetRow>,
}

pub fn parse_api_export(raw: &str) -> Result<ApiExport> {
    serde_json::from_str(raw).context("API export is not valid JSON")
}

/// Drop every line before the one containing the header marker.
///
/// Text without a header line is returned unchanged.
pub fn strip_sheet_preamble(raw: &str) -> &str {
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        if line.contains(SHEET_HEADER_MARKER) {
            return &raw[offset..];
        }
        offset += line.len();
    }
    raw
}

/// Parse the sheet CSV. Unknown columns are ignored; missing ones read as empty.
pub fn parse_sheet_csv(raw: &str) -> Result<Vec<SheetRow>> {
    let table = strip_sheet_preamble(raw);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(table.as_bytes());
    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<SheetRow>().enumerate() {
        rows.push(record.with_context(|| format!("sheet row {line} is malformed"))?);
    }
    Ok(rows)
}

pub async fn load_api_export(path: &Path) -> Result<ApiExport> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("couldn't read API export {}", path.display()))?;
    parse_api_export(&raw).with_context(|| format!("couldn't decode {}", path.display()))
}

pub async fn load_sheet(path: &Path) -> Result<Vec<SheetRow>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("couldn't read sheet export {}", path.display()))?;
    parse_sheet_csv(&raw).with_context(|| format!("couldn't decode {}", path.display()))
}

/// Read both snapshots concurrently. Fails if either load fails.
pub async fn load_snapshots(api_path: &Path, sheet_path: &Path) -> Result<Snapshots> {
    let (api, sheet) = tokio::try_join!(load_api_export(api_path), load_sheet(sheet_path))?;
    debug!(
        projects = api.projects.len(),
        videos = api.videos.len(),
        rows = sheet.len(),
        "snapshots loaded"
    );
    Ok(Snapshots { api, sheet })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "All Projects,,,,\n\
        last updated whenever,,,,\n\
        Project Name,Creator,Start Date,Deadline,Links to Active Project Page OR Finished Result,Notes\n\
        Bolero,u/Alice extra text,\"October 9th, 2020\",\"November 1, 2020\",https://youtu.be/abc123,\n\
        Nocturne,u/bob,\"March 1, 2021\",\"April 2, 2021\",,late\n";

    #[test]
    fn test_strip_preamble() {
        let table = strip_sheet_preamble(SHEET);
        assert!(table.starts_with("Project Name,"));
        assert_eq!(strip_sheet_preamble("a,b\n1,2\n"), "a,b\n1,2\n");
    }

    #[test]
    fn test_parse_sheet_csv() {
        let rows = parse_sheet_csv(SHEET).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].project_name, "Bolero");
        assert_eq!(rows[0].creator, "u/Alice extra text");
        assert_eq!(rows[0].start_date, "October 9th, 2020");
        assert_eq!(rows[0].link, "https://youtu.be/abc123");
        assert_eq!(rows[1].link, "");
    }

    #[test]
    fn test_parse_api_export_rejects_garbage() {
        assert!(parse_api_export("{not json").is_err());
        let empty = parse_api_export("{}").unwrap();
        assert!(empty.projects.is_empty());
        assert!(empty.videos.is_empty());
    }

    #[tokio::test]
    async fn test_load_snapshots_joins_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let api_path = dir.path().join("projects.json");
        let sheet_path = dir.path().join("allprojects.csv");
        std::fs::write(&api_path, r#"{"Projects": [], "Videos": []}"#).unwrap();
        std::fs::write(&sheet_path, SHEET).unwrap();

        let snapshots = load_snapshots(&api_path, &sheet_path).await.unwrap();
        assert_eq!(snapshots.sheet.len(), 2);

        let missing = dir.path().join("missing.csv");
        let err = load_snapshots(&api_path, &missing).await.unwrap_err();
        assert!(format!("{err:#}").contains("missing.csv"));
    }
}
