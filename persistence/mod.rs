/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Durable list of previously selected endpoints.
//!
//! The list is stored as `{ "browsers": [..] }`. Stores hand back raw strings;
//! [`HistoryList`] owns the invariants (no sentinel, no duplicates).

pub mod history;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use history::HistoryList;

pub const HISTORY_KEY: &str = "browsers";
const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, thiserror::Error)]
pub enum HistoryStoreError {
    #[error("failed to access history at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("history at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no configuration directory is available for the history file")]
    NoConfigDir,
}

pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<String>, HistoryStoreError>;

    /// Replace the stored list. Last writer wins.
    fn save(&self, entries: &[String]) -> Result<(), HistoryStoreError>;
}

#[derive(Serialize)]
struct HistoryFileRef<'a> {
    browsers: &'a [String],
}

#[derive(Deserialize)]
struct HistoryFile {
    #[serde(default)]
    browsers: Value,
}

/// Reads the `browsers` value; anything but an array of strings is empty.
fn entries_from_value(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(entry) => Some(entry),
                _ => None,
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!("stored {HISTORY_KEY} is not a list ({other}); treating as empty");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/browserui/history.json`.
    pub fn default_path() -> Result<PathBuf, HistoryStoreError> {
        dirs::config_dir()
            .map(|dir| dir.join("browserui").join(HISTORY_FILE_NAME))
            .ok_or(HistoryStoreError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> HistoryStoreError {
        HistoryStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load(&self) -> Result<Vec<String>, HistoryStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no history at {}; starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(error) => return Err(self.io_error(error)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let file: HistoryFile =
            serde_json::from_str(&raw).map_err(|source| HistoryStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(entries_from_value(file.browsers))
    }

    fn save(&self, entries: &[String]) -> Result<(), HistoryStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
        }
        let encoded = serde_json::to_vec_pretty(&HistoryFileRef { browsers: entries })
            .map_err(HistoryStoreError::Encode)?;
        fs::write(&self.path, encoded).map_err(|error| self.io_error(error))
    }
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().map(Into::into).collect()),
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<String>, HistoryStoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, entries: &[String]) -> Result<(), HistoryStoreError> {
        *self.entries.lock() = entries.to_vec();
        Ok(())
    }
}
