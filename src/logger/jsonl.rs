//! JSONL run log: append-only line-delimited JSON, one entry per run stage.
//!
//! Each line is a self-contained JSON object assembled in memory and written
//! with a single `write_all`, so a tailing process never sees a partial line.
//!
//! Degradation chain:
//! 1. Primary file path
//! 2. Fallback path (when configured)
//! 3. stderr with `[SAH-LOG]` prefix
//! 4. Silent discard (logging failures must never fail a run)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::LogConfig;
use crate::core::errors::{Result, SahError};

/// Run-stage event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    RunStart,
    SetupComplete,
    CommandIssued,
    VerdictRecorded,
    TargetTerminated,
    Error,
}

/// One JSONL entry. `ts`, `event`, and `scenario` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Run stage.
    pub event: RunEvent,
    /// Scenario identity.
    pub scenario: String,
    /// Wire command label (when a command is involved).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Extracted result code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// PASS/FAIL label once recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    /// Target process pid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// SAH error code when the stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable failure details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RunLogEntry {
    /// New entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: RunEvent, scenario: impl Into<String>) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event,
            scenario: scenario.into(),
            command: None,
            code: None,
            verdict: None,
            pid: None,
            error_code: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Fallback,
    Stderr,
    Discard,
}

/// Append-only JSONL run-log writer with multi-level fallback.
pub struct RunLogger {
    config: LogConfig,
    writer: Option<File>,
    state: WriterState,
}

impl RunLogger {
    /// Open the run log. Falls through the degradation chain on failure.
    #[must_use]
    pub fn open(config: LogConfig) -> Self {
        let mut logger = Self {
            config,
            writer: None,
            state: WriterState::Discard,
        };
        logger.try_open_primary();
        logger
    }

    /// Write one entry as a single atomic line.
    pub fn write(&mut self, entry: &RunLogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                // Serialization failure is a programming error; surface and bail.
                let _ = writeln!(io::stderr(), "[SAH-LOG] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    /// Current degradation state.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Fallback => "fallback",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        match self.state {
            WriterState::Normal | WriterState::Fallback => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_err() {
                        self.degrade();
                        self.write_line(line); // retry at next level
                    }
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[SAH-LOG] {line}");
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        match open_append(&self.config.path) {
            Ok(file) => {
                self.writer = Some(file);
                self.state = WriterState::Normal;
            }
            Err(_) => self.try_open_fallback(),
        }
    }

    fn try_open_fallback(&mut self) {
        if let Some(fb) = self.config.fallback_path.clone() {
            if let Ok(file) = open_append(&fb) {
                let _ = writeln!(
                    io::stderr(),
                    "[SAH-LOG] primary path failed, using fallback: {}",
                    fb.display()
                );
                self.writer = Some(file);
                self.state = WriterState::Fallback;
                return;
            }
        }
        self.state = WriterState::Stderr;
        let _ = writeln!(io::stderr(), "[SAH-LOG] log file unavailable, using stderr");
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => self.try_open_fallback(),
            WriterState::Fallback => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[SAH-LOG] fallback write failed, using stderr");
            }
            WriterState::Stderr => self.state = WriterState::Discard,
            WriterState::Discard => {}
        }
    }
}

/// Open or create a file for appending, creating parent directories.
fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SahError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SahError::io(path, source))
}

// ──────────────────────── tests ────────────────────────
