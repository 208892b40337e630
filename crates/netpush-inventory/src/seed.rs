//! Seed hostname list

use std::collections::HashSet;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::SeedError;

/// Column holding the hostnames
pub const HOSTNAME_COLUMN: &str = "Hostname";

/// Load hostnames from the `Hostname` column of a CSV file
///
/// Blank cells are skipped and repeated hostnames are kept once, at
/// their first position.
///
/// # Errors
/// Returns an error if the file is missing, unreadable, lacks the
/// column or yields no hostname.
pub fn load_seed_hostnames(path: &Path) -> Result<Vec<String>, SeedError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SeedError::NotFound(path.to_path_buf()),
        _ => SeedError::Io(e),
    })?;

    let corrupt = |e: csv::Error| SeedError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let column = reader
        .headers()
        .map_err(corrupt)?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == HOSTNAME_COLUMN)
        .ok_or_else(|| SeedError::MissingColumn {
            path: path.to_path_buf(),
            column: HOSTNAME_COLUMN.to_string(),
        })?;

    let mut seen = HashSet::new();
    let mut hostnames = Vec::new();

    for record in reader.records() {
        let record = record.map_err(corrupt)?;
        let Some(hostname) = record.get(column).filter(|h| !h.is_empty()) else {
            continue;
        };
        if seen.insert(hostname.to_string()) {
            hostnames.push(hostname.to_string());
        } else {
            warn!(host = %hostname, "duplicate hostname in seed file, ignoring");
        }
    }

    if hostnames.is_empty() {
        return Err(SeedError::Empty(path.to_path_buf()));
    }

    debug!(path = %path.display(), count = hostnames.len(), "loaded seed hostnames");
    Ok(hostnames)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn seed(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_hostname_column() {
        let file = seed("Site,Hostname\nHQ,SW1\nHQ, SW2 \nBR,\nBR,SW3\n");
        let hosts = load_seed_hostnames(file.path()).unwrap();
        assert_eq!(hosts, vec!["SW1", "SW2", "SW3"]);
    }

    #[test]
    fn test_deduplicates_in_order() {
        let file = seed("Hostname\nSW2\nSW1\nSW2\n");
        let hosts = load_seed_hostnames(file.path()).unwrap();
        assert_eq!(hosts, vec!["SW2", "SW1"]);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let file = seed("Site,Hostname\nHQ\nHQ,SW1\n");
        let hosts = load_seed_hostnames(file.path()).unwrap();
        assert_eq!(hosts, vec!["SW1"]);
    }

    #[test]
    fn test_byte_order_mark_header() {
        let file = seed("\u{feff}Hostname\nSW1\n");
        assert_eq!(load_seed_hostnames(file.path()).unwrap(), vec!["SW1"]);
    }

    #[test]
    fn test_missing_column() {
        let file = seed("Name\nSW1\n");
        assert!(matches!(
            load_seed_hostnames(file.path()),
            Err(SeedError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_empty_list() {
        let file = seed("Hostname\n\n");
        assert!(matches!(
            load_seed_hostnames(file.path()),
            Err(SeedError::Empty(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            load_seed_hostnames(&path),
            Err(SeedError::NotFound(_))
        ));
    }
}
