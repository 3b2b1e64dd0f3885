/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The install/confirmation surface.
//!
//! The surface decides which endpoint it was opened for, keeps the history
//! list, and announces confirmed endpoints on the `confirm` topic. It never
//! touches a resolver; whoever subscribes to `confirm` applies the change.

pub mod confirm;

use std::sync::Arc;

use log::{debug, info};
use register_protocol::SchemeRequest;

pub use confirm::{CONFIRM_TOPIC, ConfirmationMessage, MessageBus, Subscription};

use crate::diagnostics::{
    CHANNEL_HISTORY_APPENDED, CHANNEL_HISTORY_REMOVED, CHANNEL_INSTALL_CONFIRMED, emit_message,
};
use crate::persistence::{HistoryList, HistoryStore, HistoryStoreError};
use crate::protocols::{BROWSERUI_SCHEME, EndpointError, INSTALL_QUERY_PARAM, UiEndpoint};

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error(transparent)]
    Store(#[from] HistoryStoreError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("failed to publish confirmation: {0}")]
    Publish(#[from] serde_json::Error),
    #[error("`{0}` is not in the history list")]
    NotInHistory(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Appended,
    AlreadyPresent,
    DefaultRequested,
}

/// The endpoint an install page at `location` was opened for.
///
/// A `browserui` location names the endpoint itself; any other location
/// carries it in the `browserui` query parameter. Anything unusable means
/// the sentinel.
pub fn requested_endpoint(location: &str) -> UiEndpoint {
    let location = location.trim();
    if location
        .get(..BROWSERUI_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BROWSERUI_SCHEME))
    {
        return UiEndpoint::parse(location).unwrap_or(UiEndpoint::Default);
    }

    SchemeRequest::parse(location)
        .ok()
        .and_then(|request| request.query_param(INSTALL_QUERY_PARAM))
        .and_then(|raw| UiEndpoint::parse(&raw).ok())
        .unwrap_or(UiEndpoint::Default)
}

pub struct InstallSurface {
    requested: UiEndpoint,
    history: HistoryList,
    store: Arc<dyn HistoryStore>,
    bus: MessageBus,
}

impl InstallSurface {
    pub fn open(
        location: &str,
        store: Arc<dyn HistoryStore>,
        bus: MessageBus,
    ) -> Result<Self, InstallError> {
        let history = HistoryList::from_stored(store.load()?);
        let requested = requested_endpoint(location);
        debug!(
            "install surface opened for {requested} with {} history entries",
            history.len()
        );
        Ok(Self {
            requested,
            history,
            store,
            bus,
        })
    }

    pub fn requested(&self) -> &UiEndpoint {
        &self.requested
    }

    /// The "install" control is hidden when the sentinel was requested.
    pub fn offers_install(&self) -> bool {
        !self.requested.is_default()
    }

    pub fn history(&self) -> &HistoryList {
        &self.history
    }

    /// Record `uri` in the history (unless it is the sentinel or already
    /// listed), then announce it on the `confirm` topic.
    pub fn install(&mut self, uri: &str) -> Result<InstallOutcome, InstallError> {
        let endpoint = UiEndpoint::parse(uri)?;
        let outcome = if endpoint.is_default() {
            InstallOutcome::DefaultRequested
        } else if self.history.append(&endpoint) {
            if let Err(error) = self.store.save(self.history.entries()) {
                self.history.remove(endpoint.as_str());
                return Err(error.into());
            }
            emit_message(CHANNEL_HISTORY_APPENDED, endpoint.as_str().len());
            InstallOutcome::Appended
        } else {
            InstallOutcome::AlreadyPresent
        };

        self.publish(&endpoint)?;
        info!("confirmed browserui endpoint {endpoint} ({outcome:?})");
        Ok(outcome)
    }

    pub fn install_requested(&mut self) -> Result<InstallOutcome, InstallError> {
        let requested = self.requested.as_str().to_string();
        self.install(&requested)
    }

    /// "Reset to default": confirm the sentinel.
    pub fn reset(&mut self) -> Result<InstallOutcome, InstallError> {
        self.install(UiEndpoint::Default.as_str())
    }

    /// Switch to an endpoint already in the history list.
    pub fn go(&mut self, uri: &str) -> Result<InstallOutcome, InstallError> {
        let endpoint = UiEndpoint::parse(uri)?;
        if !self.history.contains(endpoint.as_str()) {
            return Err(InstallError::NotInHistory(uri.to_string()));
        }
        self.install(endpoint.as_str())
    }

    /// Drop `uri` from the history list. Never touches the active
    /// registration; a missing entry is a no-op.
    pub fn remove(&mut self, uri: &str) -> Result<bool, InstallError> {
        let Some(position) = self.history.position(uri) else {
            return Ok(false);
        };
        let previous = self.history.clone();
        self.history.remove(uri);
        if let Err(error) = self.store.save(self.history.entries()) {
            self.history = previous;
            return Err(error.into());
        }
        debug!("removed history entry {position}: {uri}");
        emit_message(CHANNEL_HISTORY_REMOVED, uri.len());
        Ok(true)
    }

    fn publish(&self, endpoint: &UiEndpoint) -> Result<(), InstallError> {
        let message = ConfirmationMessage {
            uri: endpoint.as_str().to_string(),
        };
        self.bus.publish(CONFIRM_TOPIC, &message)?;
        emit_message(CHANNEL_INSTALL_CONFIRMED, message.uri.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::persistence::MemoryHistoryStore;

    struct FailingStore;

    impl HistoryStore for FailingStore {
        fn load(&self) -> Result<Vec<String>, HistoryStoreError> {
            Ok(Vec::new())
        }

        fn save(&self, _entries: &[String]) -> Result<(), HistoryStoreError> {
            Err(HistoryStoreError::NoConfigDir)
        }
    }

    fn surface(
        location: &str,
        store: Arc<MemoryHistoryStore>,
    ) -> (InstallSurface, Subscription) {
        let bus = MessageBus::new();
        let subscription = bus.subscribe(CONFIRM_TOPIC);
        (InstallSurface::open(location, store, bus).unwrap(), subscription)
    }

    #[rstest]
    #[case("browserui://custom1", "browserui://custom1")]
    #[case(
        "resource://browserui/owner/install-page.html?browserui=http%3A%2F%2Flocalhost%2Fui",
        "http://localhost/ui"
    )]
    #[case("resource://browserui/owner/install-page.html", "browserui://")]
    #[case("resource://browserui/owner/install-page.html?browserui=%20", "browserui://")]
    #[case("browserui://", "browserui://")]
    fn requested_endpoint_follows_location(#[case] location: &str, #[case] expected: &str) {
        assert_eq!(requested_endpoint(location).as_str(), expected);
    }

    #[test]
    fn installing_new_endpoint_appends_saves_and_publishes() {
        let store = Arc::new(MemoryHistoryStore::new());
        let (mut surface, subscription) = surface("browserui://custom1", store.clone());

        assert!(surface.offers_install());
        assert_eq!(surface.install_requested().unwrap(), InstallOutcome::Appended);
        assert_eq!(store.snapshot(), vec!["browserui://custom1"]);
        assert_eq!(
            subscription.try_next(),
            Some(ConfirmationMessage {
                uri: "browserui://custom1".to_string()
            })
        );
    }

    #[test]
    fn installing_the_sentinel_publishes_without_saving() {
        let store = Arc::new(MemoryHistoryStore::with_entries(["http://a/"]));
        let (mut surface, subscription) = surface("browserui://", store.clone());

        assert!(!surface.offers_install());
        assert_eq!(surface.reset().unwrap(), InstallOutcome::DefaultRequested);
        assert_eq!(store.snapshot(), vec!["http://a/"]);
        assert_eq!(
            subscription.try_next::<ConfirmationMessage>().map(|message| message.uri),
            Some("browserui://".to_string())
        );
    }

    #[test]
    fn duplicate_install_still_publishes() {
        let store = Arc::new(MemoryHistoryStore::with_entries(["browserui://custom1"]));
        let (mut surface, subscription) = surface("browserui://custom1", store.clone());

        assert_eq!(surface.install_requested().unwrap(), InstallOutcome::AlreadyPresent);
        assert_eq!(store.snapshot(), vec!["browserui://custom1"]);
        assert_eq!(subscription.drain::<ConfirmationMessage>().len(), 1);
    }

    #[test]
    fn go_requires_a_listed_entry() {
        let store = Arc::new(MemoryHistoryStore::with_entries(["http://a/"]));
        let (mut surface, subscription) = surface("browserui://", store);

        assert_eq!(surface.go("http://a/").unwrap(), InstallOutcome::AlreadyPresent);
        assert!(matches!(surface.go("http://b/"), Err(InstallError::NotInHistory(_))));
        assert_eq!(subscription.drain::<ConfirmationMessage>().len(), 1);
    }

    #[test]
    fn remove_only_touches_the_list() {
        let store = Arc::new(MemoryHistoryStore::with_entries(["http://a/", "http://b/"]));
        let (mut surface, subscription) = surface("browserui://", store.clone());

        assert!(surface.remove("http://a/").unwrap());
        assert!(!surface.remove("http://missing/").unwrap());
        assert_eq!(store.snapshot(), vec!["http://b/"]);
        assert!(subscription.try_next::<ConfirmationMessage>().is_none());
    }

    #[test]
    fn unnormalized_spellings_reach_installed_entries() {
        let store = Arc::new(MemoryHistoryStore::new());
        let (mut surface, subscription) = surface("browserui://", store.clone());

        assert_eq!(surface.install("http://a").unwrap(), InstallOutcome::Appended);
        assert_eq!(store.snapshot(), vec!["http://a/"]);
        assert_eq!(surface.go("http://a").unwrap(), InstallOutcome::AlreadyPresent);
        assert_eq!(
            subscription
                .drain::<ConfirmationMessage>()
                .into_iter()
                .map(|message| message.uri)
                .collect::<Vec<_>>(),
            vec!["http://a/", "http://a/"]
        );

        assert!(surface.remove("http://a").unwrap());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn open_sanitizes_stored_history() {
        let store = Arc::new(MemoryHistoryStore::with_entries([
            "http://b/",
            "browserui://",
            "http://a/",
            "http://a/",
        ]));
        let (surface, _) = surface("browserui://", store);
        assert_eq!(surface.history().entries(), ["http://b/", "http://a/"]);
    }

    #[test]
    fn failed_save_rolls_back_and_does_not_publish() {
        let bus = MessageBus::new();
        let subscription = bus.subscribe(CONFIRM_TOPIC);
        let mut surface =
            InstallSurface::open("browserui://custom1", Arc::new(FailingStore), bus).unwrap();

        assert!(matches!(surface.install_requested(), Err(InstallError::Store(_))));
        assert!(surface.history().is_empty());
        assert!(subscription.try_next::<ConfirmationMessage>().is_none());
    }

    #[test]
    fn invalid_uris_are_rejected() {
        let (mut surface, _) = surface("browserui://", Arc::new(MemoryHistoryStore::new()));
        assert!(matches!(surface.install("not a uri"), Err(InstallError::Endpoint(_))));
    }
}
