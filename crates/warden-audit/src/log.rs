// log.rs — Append-only JSONL action log.
//
// One JSON object per line. Each record's `previous_hash` is the SHA-256 of
// the raw line before it, so inserting, deleting, or rewriting a line breaks
// the chain.
//
// Readers are forgiving: a line that does not parse is skipped with a
// warning, because the gaming heuristics must keep working on a partially
// damaged history. `verify_chain` is the strict reader.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::AuditError;
use crate::hasher;
use crate::record::AuditRecord;

/// An append-only action log backed by a JSONL file.
pub struct ActionLog {
    writer: BufWriter<File>,
    path: PathBuf,
    /// Hash of the last line written, for the next record's `previous_hash`.
    last_hash: Option<String>,
}

impl ActionLog {
    /// Open (or create) the log, recovering the hash chain from existing content.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let last_hash = if path.exists() {
            Self::read_last_hash(&path)?
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| AuditError::OpenFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            None
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            last_hash,
        })
    }

    /// Append a record, chaining it to the previous one. Flushes before returning.
    pub fn append(&mut self, record: &mut AuditRecord) -> Result<(), AuditError> {
        record.previous_hash = self.last_hash.clone();
        let json = serde_json::to_string(record)?;
        self.last_hash = Some(hasher::hash_str(&json));
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read every parseable record, oldest first. A missing file is an empty log.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let mut records = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    line = line_num + 1,
                    error = %e,
                    "skipping unreadable action log line"
                ),
            }
        }
        Ok(records)
    }

    /// The most recent `n` records, oldest first.
    pub fn recent(path: impl AsRef<Path>, n: usize) -> Result<Vec<AuditRecord>, AuditError> {
        let mut records = Self::read_all(path)?;
        let start = records.len().saturating_sub(n);
        Ok(records.split_off(start))
    }

    /// The last `n` outcome records (see `AuditRecord::is_outcome`), oldest first.
    pub fn recent_outcomes(path: impl AsRef<Path>, n: usize) -> Result<Vec<AuditRecord>, AuditError> {
        let mut outcomes: Vec<AuditRecord> = Self::read_all(path)?
            .into_iter()
            .filter(AuditRecord::is_outcome)
            .collect();
        let start = outcomes.len().saturating_sub(n);
        Ok(outcomes.split_off(start))
    }

    /// Records with `from <= timestamp < until`. An open `until` means "up to now".
    pub fn between(
        path: impl AsRef<Path>,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(Self::read_all(path)?
            .into_iter()
            .filter(|r| r.timestamp >= from && until.map_or(true, |u| r.timestamp < u))
            .collect())
    }

    /// Verify the hash chain. Returns the number of records checked, or an
    /// `IntegrityViolation` naming the first broken line.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<usize, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let mut previous_hash: Option<String> = None;
        let mut checked = 0;

        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(&line)?;
            if record.previous_hash != previous_hash {
                return Err(AuditError::IntegrityViolation {
                    line: line_num + 1,
                    expected: previous_hash.unwrap_or_else(|| "None".to_string()),
                    actual: record.previous_hash.unwrap_or_else(|| "None".to_string()),
                });
            }
            // Hash the raw line, not a re-serialization: field order must not matter.
            previous_hash = Some(hasher::hash_str(&line));
            checked += 1;
        }

        Ok(checked)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut last_line: Option<String> = None;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }
        Ok(last_line.map(|line| hasher::hash_str(&line)))
    }
}
