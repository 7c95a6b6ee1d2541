use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::models::{ParticipantStatRow, COLUMNS};

/// Append-only CSV file of participant rows.
///
/// Whether to write the header is decided by looking at the file right before
/// each write, so a restarted process picks up where the last one stopped.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `rows`, returning how many were written.
    pub fn append(&self, rows: &[ParticipantStatRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        // Missing and zero-length files both start with the header.
        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        if !needs_header {
            self.check_header()?;
        } else if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write row for {}", row.match_id))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(rows.len())
    }

    // Rows from a different column layout must never land under this header.
    fn check_header(&self) -> Result<()> {
        let file = fs::File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut first = String::new();
        BufReader::new(file).read_line(&mut first)?;
        let first = first.trim_end_matches(['\r', '\n']);
        if first.is_empty() {
            return Err(anyhow!(
                "{} exists but has no header line",
                self.path.display()
            ));
        }
        if first != COLUMNS.join(",") {
            return Err(anyhow!(
                "{} was written with a different column layout",
                self.path.display()
            ));
        }
        Ok(())
    }
}
