//! Output directory access
//!
//! The output directory is the crawl's only persistent state. A match counts
//! as completed exactly when `match_<id>.csv` exists, and records are written
//! to a temporary file first so a crash never leaves a partial record.

use crate::output::{MatchRecord, OutputError, OutputResult};
use crate::state::MatchId;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const RECORD_PREFIX: &str = "match_";
const RECORD_EXTENSION: &str = ".csv";

/// Directory of per-match record files
#[derive(Debug, Clone)]
pub struct OutputStore {
    directory: PathBuf,
}

impl OutputStore {
    /// Opens the output directory, creating it when missing
    pub fn new(directory: impl Into<PathBuf>) -> OutputResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Deterministic file name of a match record
    pub fn record_path(&self, id: &MatchId) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", RECORD_PREFIX, id, RECORD_EXTENSION))
    }

    /// Identifiers of all records present on disk
    pub fn completed_ids(&self) -> OutputResult<BTreeSet<MatchId>> {
        let mut ids = BTreeSet::new();

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(parse_record_name) {
                ids.insert(MatchId::new(id));
            }
        }

        Ok(ids)
    }

    /// Paths of all records present on disk, sorted by name
    pub fn record_paths(&self) -> OutputResult<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = self
            .completed_ids()?
            .iter()
            .map(|id| self.record_path(id))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Writes a record atomically
    ///
    /// Records are immutable: writing an identifier that already has a record
    /// fails with `OutputError::AlreadyExists` and leaves the file untouched.
    pub fn write_record(&self, id: &MatchId, record: &MatchRecord) -> OutputResult<PathBuf> {
        let path = self.record_path(id);

        let mut temp = NamedTempFile::new_in(&self.directory)?;
        record.write_csv(temp.as_file_mut())?;
        temp.as_file().sync_all()?;

        temp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                OutputError::AlreadyExists(path.clone())
            } else {
                OutputError::Io(e.error)
            }
        })?;

        Ok(path)
    }
}

/// Extracts the identifier from a `match_<id>.csv` file name
fn parse_record_name(name: &str) -> Option<&str> {
    name.strip_prefix(RECORD_PREFIX)
        .and_then(|rest| rest.strip_suffix(RECORD_EXTENSION))
        .filter(|id| !id.is_empty())
}
