//! Run summaries and the optional JSON report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::file_category::Category;
use crate::file_organizer::MoveRecord;

/// A file that could not be organized, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}

/// What happened during one walk over the source directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Completed moves, or planned moves in a dry run, in walk order.
    pub moves: Vec<MoveRecord>,
    /// Files that could not be moved. The walk continued past each of them.
    pub failures: Vec<Failure>,
    /// Files left alone by the filter rules.
    pub skipped: usize,
    /// Moved (or planned) files per category.
    pub per_category: BTreeMap<Category, usize>,
}

impl RunSummary {
    /// Records a completed (or planned) move.
    pub fn record_move(&mut self, record: MoveRecord) {
        *self.per_category.entry(record.category).or_insert(0) += 1;
        self.moves.push(record);
    }

    /// Records a file that could not be organized.
    pub fn record_failure(&mut self, path: PathBuf, reason: impl Into<String>) {
        self.failures.push(Failure {
            path,
            reason: reason.into(),
        });
    }

    pub fn moved(&self) -> usize {
        self.moves.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Files seen by the walk, whatever became of them.
    pub fn total_processed(&self) -> usize {
        self.moved() + self.failed() + self.skipped
    }
}

/// Errors writing the JSON report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write report {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A [`RunSummary`] with the context it was produced in.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source: PathBuf,
    pub target: PathBuf,
    pub dry_run: bool,
    pub moved: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl RunReport {
    pub fn new(
        started_at: DateTime<Utc>,
        source: &Path,
        target: &Path,
        dry_run: bool,
        summary: RunSummary,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            dry_run,
            moved: summary.moved(),
            failed: summary.failed(),
            skipped: summary.skipped,
            summary,
        }
    }

    /// Writes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn record(name: &str, category: Category) -> MoveRecord {
        MoveRecord {
            source: PathBuf::from("in").join(name),
            destination: PathBuf::from("out").join(category.dir_name()).join(name),
            category,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record_move(record("a.txt", Category::Documents));
        summary.record_move(record("b.pdf", Category::Documents));
        summary.record_move(record("c.xyz", Category::Others));
        summary.record_failure(PathBuf::from("in/d.log"), "permission denied");
        summary.skipped = 2;

        assert_eq!(summary.moved(), 3);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total_processed(), 6);
        assert_eq!(summary.per_category[&Category::Documents], 2);
        assert_eq!(summary.per_category[&Category::Others], 1);
        assert!(!summary.per_category.contains_key(&Category::Logs));
    }

    #[test]
    fn test_report_json_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let mut summary = RunSummary::default();
        summary.record_move(record("a.txt", Category::Documents));
        summary.record_failure(PathBuf::from("in/b.jpg"), "Destination already exists");

        let report = RunReport::new(
            Utc::now(),
            Path::new("in"),
            Path::new("out"),
            false,
            summary,
        );
        report.save(&path).unwrap();

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["moved"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["dry_run"], false);
        assert_eq!(json["per_category"]["Documents"], 1);
        assert_eq!(json["moves"][0]["category"], "Documents");
        assert_eq!(json["failures"][0]["reason"], "Destination already exists");
        assert!(json["started_at"].is_string());
    }

    #[test]
    fn test_report_write_failure() {
        let report = RunReport::new(
            Utc::now(),
            Path::new("in"),
            Path::new("out"),
            true,
            RunSummary::default(),
        );
        let result = report.save(Path::new("/no/such/dir/report.json"));
        assert!(matches!(result, Err(ReportError::Write { .. })));
    }
}
