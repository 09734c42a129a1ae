use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, warn};

use crate::pipeline::ReportRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// What `save_results` did. `Display` is the console status line.
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    NoData,
    UnsupportedFormat(String),
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOutcome::Saved(path) => write!(f, "Results saved to {}", path.display()),
            SaveOutcome::NoData => f.write_str("No data to save."),
            SaveOutcome::UnsupportedFormat(name) => {
                write!(f, "Invalid output format '{name}'. Use 'csv' or 'json'.")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("cannot write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `rows` to `filename` as CSV or JSON.
///
/// Nothing is created for an empty row list or an unrecognised format. For
/// JSON a trailing `.csv` in `filename` becomes `.json`.
pub fn save_results(
    rows: &[ReportRow],
    filename: &Path,
    format: &str,
) -> Result<SaveOutcome, ReportError> {
    if rows.is_empty() {
        warn!(path = %filename.display(), "no rows to save");
        return Ok(SaveOutcome::NoData);
    }

    let Some(output_format) = OutputFormat::parse(format) else {
        warn!(format, "unsupported output format");
        return Ok(SaveOutcome::UnsupportedFormat(format.to_string()));
    };

    let path = match output_format {
        OutputFormat::Csv => {
            write_csv(rows, filename)?;
            filename.to_path_buf()
        }
        OutputFormat::Json => {
            let path = json_path(filename);
            write_json(rows, &path)?;
            path
        }
    };

    debug!(path = %path.display(), rows = rows.len(), "report written");
    Ok(SaveOutcome::Saved(path))
}

fn json_path(filename: &Path) -> PathBuf {
    match filename.to_str().and_then(|s| s.strip_suffix(".csv")) {
        Some(stem) => PathBuf::from(format!("{stem}.json")),
        None => filename.to_path_buf(),
    }
}

fn write_csv(rows: &[ReportRow], path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| io_error(path, source))
}

fn write_json(rows: &[ReportRow], path: &Path) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| io_error(path, source))?;
    let mut serializer = serde_json::Serializer::with_formatter(
        BufWriter::new(file),
        PrettyFormatter::with_indent(b"    "),
    );
    rows.serialize(&mut serializer)?;

    let mut writer = serializer.into_inner();
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: io::Error) -> ReportError {
    ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubmed::types::{AuthorEntry, PaperRecord};
    use tempfile::tempdir;

    fn paper(id: &str, authors: Vec<(&str, &str)>) -> ReportRow {
        ReportRow::from_record(PaperRecord {
            id: id.into(),
            title: Some(format!("Title, with \"quotes\" {id}")),
            pub_date: Some("2024 Mar 3".into()),
            authors: authors
                .into_iter()
                .map(|(name, aff)| AuthorEntry {
                    name: Some(name.into()),
                    affiliation: Some(aff.into()),
                })
                .collect(),
            correspondence: Some(format!("author{id}@example.org")),
        })
    }

    fn sample_rows() -> Vec<ReportRow> {
        vec![
            paper(
                "1",
                vec![
                    ("Jane Roe", "Acme Pharma"),
                    ("Ann Lee", "Harvard University"),
                    ("Max Mustermann", "Widget Inc"),
                ],
            ),
            paper("2", vec![("Bo Chan", "Oxford University")]),
        ]
    }

    #[test]
    fn csv_has_header_in_fixed_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let outcome = save_results(&sample_rows(), &path, "csv").unwrap();
        assert_eq!(outcome, SaveOutcome::Saved(path.clone()));

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "PubmedID,Title,Publication Date,Non-academic Author(s),Company Affiliation(s),Corresponding Author Email"
        );
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn csv_reads_back_identical_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let rows = sample_rows();

        save_results(&rows, &path, "csv").unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let back: Vec<ReportRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(back, rows);
        assert!(back[0].has_company_authors());
        assert!(!back[1].has_company_authors());
    }

    #[test]
    fn company_row_reads_back_equal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.csv");
        let rows = vec![paper("7", vec![("Jane Roe", "Acme Pharma")])];
        assert_eq!(rows[0].non_academic_authors, "Jane Roe");
        assert_eq!(rows[0].company_affiliations, "acme pharma");

        save_results(&rows, &path, "csv").unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let back: Vec<ReportRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(back, rows);
    }

    #[test]
    fn json_replaces_csv_extension_and_reads_back() {
        let dir = tempdir().unwrap();
        let requested = dir.path().join("results.csv");
        let rows = sample_rows();

        let outcome = save_results(&rows, &requested, "json").unwrap();
        let expected = dir.path().join("results.json");
        assert_eq!(outcome, SaveOutcome::Saved(expected.clone()));
        assert!(!requested.exists());

        let text = std::fs::read_to_string(&expected).unwrap();
        assert!(text.contains("\n    {\n        \"PubmedID\": \"1\""));
        let back: Vec<ReportRow> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn json_keeps_non_csv_filename() {
        assert_eq!(json_path(Path::new("out.txt")), PathBuf::from("out.txt"));
        assert_eq!(json_path(Path::new("a.csv.bak")), PathBuf::from("a.csv.bak"));
        assert_eq!(json_path(Path::new("dir/a.csv")), PathBuf::from("dir/a.json"));
    }

    #[test]
    fn empty_rows_write_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let outcome = save_results(&[], &path, "csv").unwrap();
        assert_eq!(outcome, SaveOutcome::NoData);
        assert_eq!(outcome.to_string(), "No data to save.");
        assert!(!path.exists());
    }

    #[test]
    fn unsupported_format_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let outcome = save_results(&sample_rows(), &path, "xml").unwrap();
        assert_eq!(outcome, SaveOutcome::UnsupportedFormat("xml".into()));
        assert!(outcome.to_string().contains("'csv' or 'json'"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_path_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("results.json");

        let err = save_results(&sample_rows(), &path, "json").unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
