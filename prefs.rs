/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! User preferences, read from `prefs.toml`.
//!
//! Lookup order: an explicit path, then `BROWSERUI_PREFS`, then
//! `<config_dir>/browserui/prefs.toml`. A missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use register_input::KeyChord;
use serde::{Deserialize, Serialize};

use crate::input::{ShortcutAction, ShortcutBinding};
use crate::persistence::{HistoryStoreError, JsonFileHistoryStore};
use crate::protocols::DocumentLocator;
use crate::protocols::resolver::{DEFAULT_HOST_DOCUMENT, DEFAULT_INSTALL_PAGE_BASE};

pub const PREFS_ENV: &str = "BROWSERUI_PREFS";
const PREFS_FILE_NAME: &str = "prefs.toml";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to read preferences at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid preferences: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("reload and reset shortcuts are both `{0}`")]
    ConflictingShortcuts(KeyChord),
    #[error("`{field}` is not a valid URL: {source}")]
    InvalidDocument {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutPrefs {
    pub reload: KeyChord,
    pub reset: KeyChord,
}

impl Default for ShortcutPrefs {
    fn default() -> Self {
        Self {
            reload: ShortcutBinding::default_reload().chord,
            reset: ShortcutBinding::default_reset().chord,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserUiPrefs {
    pub host_default_document: String,
    pub install_page_base: String,
    pub history_path: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub shortcuts: ShortcutPrefs,
}

impl Default for BrowserUiPrefs {
    fn default() -> Self {
        Self {
            host_default_document: DEFAULT_HOST_DOCUMENT.to_string(),
            install_page_base: DEFAULT_INSTALL_PAGE_BASE.to_string(),
            history_path: None,
            log_filter: None,
            shortcuts: ShortcutPrefs::default(),
        }
    }
}

impl BrowserUiPrefs {
    /// The prefs file to read, if any location is known.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(PREFS_ENV).map(PathBuf::from))
            .or_else(|| dirs::config_dir().map(|dir| dir.join("browserui").join(PREFS_FILE_NAME)))
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, PrefsError> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, PrefsError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no preferences at {}; using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PrefsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, PrefsError> {
        let prefs: Self = toml::from_str(raw)?;
        prefs.validate()?;
        Ok(prefs)
    }

    pub fn validate(&self) -> Result<(), PrefsError> {
        if self.shortcuts.reload == self.shortcuts.reset {
            return Err(PrefsError::ConflictingShortcuts(self.shortcuts.reload));
        }
        self.document_locator().map(|_| ())
    }

    pub fn document_locator(&self) -> Result<DocumentLocator, PrefsError> {
        url::Url::parse(&self.host_default_document).map_err(|source| {
            PrefsError::InvalidDocument {
                field: "host_default_document",
                source,
            }
        })?;
        DocumentLocator::new(&self.host_default_document, &self.install_page_base).map_err(
            |source| PrefsError::InvalidDocument {
                field: "install_page_base",
                source,
            },
        )
    }

    pub fn history_path(&self) -> Result<PathBuf, HistoryStoreError> {
        match &self.history_path {
            Some(path) => Ok(path.clone()),
            None => JsonFileHistoryStore::default_path(),
        }
    }

    pub fn shortcut_bindings(&self) -> [ShortcutBinding; 2] {
        [
            ShortcutBinding::new(self.shortcuts.reload, ShortcutAction::Reload),
            ShortcutBinding::new(self.shortcuts.reset, ShortcutAction::Reset),
        ]
    }
}
