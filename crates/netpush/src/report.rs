//! Result CSV writer

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use netpush_api::Outcome;
use tracing::info;

use crate::error::SetupError;

/// `netconf_results_<YYYY-mm-dd_HH-MM-SS>.csv`
pub fn report_file_name(at: DateTime<Local>) -> String {
    format!("netconf_results_{}.csv", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// `Host,Result,Error` CSV, created before any device is touched
pub struct ReportWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl ReportWriter {
    /// Create a new report file in `dir` and write the header
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn create(dir: &Path, at: DateTime<Local>) -> Result<Self, SetupError> {
        let path = dir.join(report_file_name(at));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| report_error(&path, e))?;

        let mut report = Self {
            path,
            writer: csv::Writer::from_writer(file),
            rows: 0,
        };
        report.write(["Host", "Result", "Error"])?;
        Ok(report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and flush it to disk
    ///
    /// # Errors
    /// Returns an error if the row cannot be written.
    pub fn record(&mut self, outcome: &Outcome) -> Result<(), SetupError> {
        self.write([
            outcome.hostname.as_str(),
            outcome.status.label(),
            outcome.detail.as_str(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Close the file, returning its path
    pub fn finish(self) -> PathBuf {
        info!(path = %self.path.display(), rows = self.rows, "wrote report");
        self.path
    }

    fn write(&mut self, record: [&str; 3]) -> Result<(), SetupError> {
        self.writer
            .write_record(record)
            .and_then(|()| self.writer.flush().map_err(csv::Error::from))
            .map_err(|e| report_error(&self.path, e))
    }
}

fn report_error(path: &Path, err: impl ToString) -> SetupError {
    SetupError::Report {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    fn write_report(dir: &Path, outcomes: &[Outcome], at: DateTime<Local>) -> Result<PathBuf, SetupError> {
        let mut report = ReportWriter::create(dir, at)?;
        for outcome in outcomes {
            report.record(outcome)?;
        }
        Ok(report.finish())
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(report_file_name(at()), "netconf_results_2024-03-09_07-05-01.csv");
    }

    #[test]
    fn test_writes_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![
            Outcome::success("SW1"),
            Outcome::lock_unavailable("SW2", "lock not acquired after 6 attempts: in use"),
            Outcome::apply_failed("SW3", "invalid syntax, near \"line vty\""),
        ];

        let path = write_report(dir.path(), &outcomes, at()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        assert_eq!(lines[0], "Host,Result,Error");
        assert_eq!(lines[1], "SW1,Success,");
        assert_eq!(
            lines[2],
            "SW2,LockUnavailable,lock not acquired after 6 attempts: in use"
        );
        assert_eq!(lines[3], r#"SW3,ApplyFailed,"invalid syntax, near ""line vty"""#);
    }

    #[test]
    fn test_empty_run_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(dir.path(), &[], at()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Host,Result,Error\n");
    }

    #[test]
    fn test_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), &[], at()).unwrap();
        assert!(matches!(
            write_report(dir.path(), &[], at()),
            Err(SetupError::Report { .. })
        ));
    }

    #[test]
    fn test_header_exists_before_any_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ReportWriter::create(dir.path(), at()).unwrap();
        let path = report.path().to_path_buf();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Host,Result,Error\n");

        report.record(&Outcome::success("SW1")).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Host,Result,Error\nSW1,Success,\n"
        );
        assert_eq!(report.finish(), path);
    }

    #[test]
    fn test_unwritable_dir_fails_at_create() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir");
        assert!(matches!(
            ReportWriter::create(&missing, at()),
            Err(SetupError::Report { .. })
        ));
    }
}
