// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Append-only control journal with daily rotation.
//!
//! Every auto-control execution appends one record per controlled tag to a
//! day-keyed JSON Lines file (`auto_control-YYYY-MM-DD.jsonl`). The journal
//! only ever appends; rotation happens by switching to a new file when the
//! UTC date changes between appends.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// =============================================================================
// Control Records
// =============================================================================

/// Outcome of a single control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    /// A write was issued and acknowledged.
    Success,
    /// The current value already matched the target; no write issued.
    Unchanged,
    /// The write was issued but the device rejected it.
    Failed,
    /// The action aborted before or during I/O.
    Error,
}

impl std::fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One journal line: a single control action against one tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRecord {
    /// When the action ran.
    pub timestamp: DateTime<Utc>,
    /// Target machine name.
    pub machine: String,
    /// Target tag name.
    pub tag: String,
    /// Value read before the action (`"unknown"` when the read failed).
    pub previous_value: String,
    /// The configured target value.
    pub target_value: String,
    /// Outcome of the action.
    pub status: ControlStatus,
    /// Error message for failed/error outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// ControlJournal
// =============================================================================

/// File name stem for journal files.
const JOURNAL_STEM: &str = "auto_control";

struct OpenJournal {
    date: NaiveDate,
    writer: BufWriter<File>,
}

/// Day-keyed, append-only journal writer.
pub struct ControlJournal {
    base_dir: PathBuf,
    inner: Mutex<Option<OpenJournal>>,
}

impl ControlJournal {
    /// Creates a journal rooted at `base_dir`, creating the directory if
    /// needed. Files are opened lazily on the first append.
    pub fn new(base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            inner: Mutex::new(None),
        })
    }

    /// Returns the journal file path for the given date.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.base_dir
            .join(format!("{}-{}.jsonl", JOURNAL_STEM, date.format("%Y-%m-%d")))
    }

    /// Appends records as JSON Lines, rotating to a new file when the UTC
    /// date has changed since the last append.
    pub fn append(&self, records: &[ControlRecord]) -> std::io::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let today = Utc::now().date_naive();
        let mut guard = self.inner.lock();

        let needs_open = match guard.as_ref() {
            Some(open) => open.date != today,
            None => true,
        };
        if needs_open {
            if let Some(mut old) = guard.take() {
                old.writer.flush()?;
            }
            let file = Self::open_file(&self.path_for(today))?;
            *guard = Some(OpenJournal {
                date: today,
                writer: BufWriter::new(file),
            });
        }

        let open = guard.as_mut().expect("journal file opened above");
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            open.writer.write_all(line.as_bytes())?;
            open.writer.write_all(b"\n")?;
        }
        open.writer.flush()?;

        tracing::debug!(
            count = records.len(),
            file = %self.path_for(today).display(),
            "Appended control journal records"
        );

        Ok(())
    }

    fn open_file(path: &Path) -> std::io::Result<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }
}

impl std::fmt::Debug for ControlJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlJournal")
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
