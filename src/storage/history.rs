//! Command History
//!
//! Every submitted command is appended to the history before it is
//! classified. History is best-effort: a failing store is reported to the
//! caller, who logs it and carries on with dispatch.
//!
//! ## File Format
//!
//! [`FileHistory`] writes one entry per line. Backslashes and line breaks
//! inside an entry are escaped (`\\`, `\n`, `\r`) so multi-line queries
//! survive a reload.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use thiserror::Error;

/// Errors raised by a history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The backing file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused the entry
    #[error("history unavailable: {0}")]
    Unavailable(String),
}

/// An append-only log of submitted command text.
pub trait HistoryStore: Send + Sync {
    /// Appends one entry.
    fn append(&self, text: &str) -> Result<(), HistoryError>;
}

/// History kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: RwLock<Vec<String>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryStore for InMemoryHistory {
    fn append(&self, text: &str) -> Result<(), HistoryError> {
        self.entries.write().unwrap().push(text.to_string());
        Ok(())
    }
}

/// History persisted to a text file, one entry per line.
#[derive(Debug)]
pub struct FileHistory {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileHistory {
    /// Opens (or creates) the history file for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Reads every entry currently stored in the file, oldest first.
    pub fn load(&self) -> Result<Vec<String>, HistoryError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            entries.push(unescape(&line?));
        }
        Ok(entries)
    }
}

impl HistoryStore for FileHistory {
    fn append(&self, text: &str) -> Result<(), HistoryError> {
        let mut file = self.file.lock().unwrap();
        writeln!(file, "{}", escape(text))?;
        file.flush()?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            // Trailing lone backslash
            None => out.push('\\'),
        }
    }
    out
}
