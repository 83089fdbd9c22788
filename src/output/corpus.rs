//! Corpus file writer
//!
//! Appends one human-readable block per case to the shared corpus file.
//! The block shape is fixed; downstream readers split on the delimiter
//! lines, so the delimiter width must not change.

use crate::crawler::CaseRecord;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Width of the `=` delimiter lines surrounding each record header
const DELIMITER_WIDTH: usize = 100;

/// Appends case records to the shared corpus file
#[derive(Debug, Clone)]
pub struct CorpusWriter {
    path: PathBuf,
}

impl CorpusWriter {
    /// Creates a writer targeting the given corpus path
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Path of the corpus file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the corpus file if it does not exist yet
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(())
    }

    /// Appends a single record block
    ///
    /// The file is opened in append mode for the duration of this call and
    /// released on return, so a write failure cannot corrupt previously
    /// written records.
    pub fn append(&self, record: &CaseRecord) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let delimiter = "=".repeat(DELIMITER_WIDTH);
        write!(file, "\n\n{delimiter}\n")?;
        write!(file, "Case ID: {}\nTitle: {}\n", record.id, record.title)?;
        write!(file, "{delimiter}\n\n")?;
        file.write_all(record.judgment.as_bytes())?;
        write!(file, "\n\n")?;

        Ok(())
    }
}
