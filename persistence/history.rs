/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use log::debug;

use crate::protocols::UiEndpoint;

/// Unique endpoint strings in insertion order. Never holds the sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryList {
    entries: Vec<String>,
}

/// The spelling an entry is stored and compared under: the parsed URL for
/// valid endpoints, the trimmed input otherwise.
fn normalize_entry(raw: &str) -> String {
    match UiEndpoint::parse(raw) {
        Ok(endpoint) => endpoint.as_str().to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

impl HistoryList {
    /// Sanitize a stored list: normalize each entry, then drop invalid
    /// entries, the sentinel and later duplicates, keeping the stored order.
    pub fn from_stored(stored: Vec<String>) -> Self {
        let mut list = Self::default();
        for raw in stored {
            match UiEndpoint::parse(&raw) {
                Ok(endpoint) => {
                    list.append(&endpoint);
                }
                Err(error) => debug!("dropping stored history entry: {error}"),
            }
        }
        list
    }

    /// Append `endpoint` unless it is the sentinel or already listed.
    pub fn append(&mut self, endpoint: &UiEndpoint) -> bool {
        if endpoint.is_default() || self.contains(endpoint.as_str()) {
            return false;
        }
        self.entries.push(endpoint.as_str().to_string());
        true
    }

    pub fn remove(&mut self, entry: &str) -> bool {
        let entry = normalize_entry(entry);
        let before = self.entries.len();
        self.entries.retain(|existing| *existing != entry);
        self.entries.len() != before
    }

    pub fn contains(&self, entry: &str) -> bool {
        let entry = normalize_entry(entry);
        self.entries.iter().any(|existing| *existing == entry)
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        let entry = normalize_entry(entry);
        self.entries.iter().position(|existing| *existing == entry)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
