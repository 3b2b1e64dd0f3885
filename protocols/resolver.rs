/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-process resolver for the `browserui://` scheme.
//!
//! Each process owns exactly one [`RegistrationRecord`] while the feature is
//! active. The record sits behind a reader/writer lock, so every resolution
//! in a process sees one consistent record and writers replace it wholesale.

use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use register_protocol::SchemeRequest;
use url::Url;

use crate::diagnostics::{
    CHANNEL_RESOLVER_FALLBACK_USED, CHANNEL_RESOLVER_REGISTERED, CHANNEL_RESOLVER_RELOAD,
    CHANNEL_RESOLVER_RESET, CHANNEL_RESOLVER_UNREGISTERED, emit_message,
};
use crate::protocols::endpoint::{BROWSERUI_SCHEME, INSTALL_QUERY_PARAM, OwnerId, UiEndpoint};

pub const DEFAULT_HOST_DOCUMENT: &str = "chrome://browser/content/browser.xhtml";
pub const DEFAULT_INSTALL_PAGE_BASE: &str = "resource://browserui/";
const INSTALL_PAGE_NAME: &str = "install-page.html";

/// Where the documents the resolver falls back to live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocator {
    host_default_document: Url,
    install_page_base: Url,
}

impl Default for DocumentLocator {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_DOCUMENT, DEFAULT_INSTALL_PAGE_BASE)
            .expect("built-in document URLs are valid")
    }
}

impl DocumentLocator {
    pub fn new(host_default_document: &str, install_page_base: &str) -> Result<Self, url::ParseError> {
        let mut base = install_page_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            host_default_document: Url::parse(host_default_document.trim())?,
            install_page_base: Url::parse(&base)?,
        })
    }

    pub fn host_default_document(&self) -> &Url {
        &self.host_default_document
    }

    /// The install page scoped to `owner`.
    pub fn install_page(&self, owner: &OwnerId) -> Option<Url> {
        self.install_page_base
            .join(&format!("{owner}/{INSTALL_PAGE_NAME}"))
            .ok()
    }

    /// The install page asking the operator to confirm `requested`.
    pub fn confirmation_page(&self, owner: &OwnerId, requested: &str) -> Option<Url> {
        let mut page = self.install_page(owner)?;
        page.query_pairs_mut()
            .append_pair(INSTALL_QUERY_PARAM, requested);
        Some(page)
    }

    fn default_document(&self, owner: Option<&OwnerId>) -> Option<Url> {
        match owner {
            Some(owner) => self.install_page(owner),
            None => Some(self.host_default_document.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub(crate) scheme: String,
    /// `None` when no default document could be derived for the owner.
    pub(crate) default_document: Option<Url>,
    pub(crate) override_uri: Option<Url>,
    pub(crate) owner_id: Option<OwnerId>,
    /// Set by a reset; the bare scheme then serves the host's own document.
    pub(crate) reset: bool,
}

impl RegistrationRecord {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn override_uri(&self) -> Option<&Url> {
        self.override_uri.as_ref()
    }

    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    pub fn is_reset(&self) -> bool {
        self.reset
    }
}

/// What a `browserui://` request should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Bare request with an active override.
    Override(Url),
    /// Bare request with no override.
    Default(Url),
    /// A concrete endpoint was requested; ask the operator to confirm it.
    Confirm(Url),
    /// Leave the request to the host's own handling.
    HostFallback,
}

impl Resolution {
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Override(url) | Self::Default(url) | Self::Confirm(url) => Some(url),
            Self::HostFallback => None,
        }
    }
}

/// Reloads chrome windows currently showing a scheme.
pub trait ChromeReloader: Send + Sync {
    /// Returns the number of windows reloaded.
    fn reload_scheme_windows(&self, scheme: &str) -> usize;
}

/// Reloader for processes that own no chrome windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChromeWindows;

impl ChromeReloader for NoChromeWindows {
    fn reload_scheme_windows(&self, _scheme: &str) -> usize {
        0
    }
}

#[derive(Clone)]
pub struct SchemeResolver {
    record: Arc<RwLock<Option<RegistrationRecord>>>,
    documents: Arc<DocumentLocator>,
    reloader: Arc<dyn ChromeReloader>,
}

impl SchemeResolver {
    pub fn new(documents: DocumentLocator, reloader: Arc<dyn ChromeReloader>) -> Self {
        Self {
            record: Arc::new(RwLock::new(None)),
            documents: Arc::new(documents),
            reloader,
        }
    }

    pub fn documents(&self) -> &DocumentLocator {
        &self.documents
    }

    /// Route the bare scheme to `target`, or to the owner's default document
    /// when `target` is absent or the sentinel. Replaces any prior record.
    pub fn register(&self, target: Option<&UiEndpoint>, owner: Option<&OwnerId>) {
        let override_uri = target.and_then(UiEndpoint::url).cloned();
        let record = RegistrationRecord {
            scheme: BROWSERUI_SCHEME.to_string(),
            default_document: self.documents.default_document(owner),
            override_uri,
            owner_id: owner.cloned(),
            reset: false,
        };
        let byte_len = record.override_uri.as_ref().map_or(0, |uri| uri.as_str().len());
        debug!(
            "browserui registered; override={:?} owner={:?}",
            record.override_uri.as_ref().map(Url::as_str),
            record.owner_id.as_ref().map(OwnerId::as_str)
        );
        *self.record.write() = Some(record);
        emit_message(CHANNEL_RESOLVER_REGISTERED, byte_len);
    }

    pub fn unregister(&self) {
        if self.record.write().take().is_some() {
            debug!("browserui unregistered");
            emit_message(CHANNEL_RESOLVER_UNREGISTERED, 0);
        }
    }

    /// Reload windows showing the scheme onto the current target. Without an
    /// override this is [`Self::reset_ui`].
    pub fn reload_ui(&self) -> usize {
        let has_override = self
            .record
            .read()
            .as_ref()
            .is_some_and(|record| record.override_uri.is_some());
        if !has_override {
            return self.reset_ui();
        }

        emit_message(CHANNEL_RESOLVER_RELOAD, 0);
        self.reloader.reload_scheme_windows(BROWSERUI_SCHEME)
    }

    /// Clear the override and reload windows showing the scheme onto the
    /// host's own default document.
    pub fn reset_ui(&self) -> usize {
        if let Some(record) = self.record.write().as_mut() {
            record.override_uri = None;
            record.reset = true;
        }
        debug!("browserui override cleared");
        emit_message(CHANNEL_RESOLVER_RESET, 0);
        self.reloader.reload_scheme_windows(BROWSERUI_SCHEME)
    }

    /// Register already reset, without reloading any window. This is how a
    /// reset reaches processes other than the one it started in.
    pub fn register_reset(&self, owner: Option<&OwnerId>) {
        let record = RegistrationRecord {
            scheme: BROWSERUI_SCHEME.to_string(),
            default_document: self.documents.default_document(owner),
            override_uri: None,
            owner_id: owner.cloned(),
            reset: true,
        };
        *self.record.write() = Some(record);
        debug!("browserui registered in reset state");
        emit_message(CHANNEL_RESOLVER_RESET, 0);
    }

    pub fn resolve(&self, request: &SchemeRequest) -> Resolution {
        if !request.has_scheme(BROWSERUI_SCHEME) {
            return Resolution::HostFallback;
        }

        let guard = self.record.read();
        let resolution = match guard.as_ref() {
            None => Resolution::HostFallback,
            Some(record) if request.is_bare() => match (&record.override_uri, &record.default_document) {
                (Some(target), _) => Resolution::Override(target.clone()),
                (None, _) if record.reset => {
                    Resolution::Default(self.documents.host_default_document().clone())
                }
                (None, Some(document)) => Resolution::Default(document.clone()),
                (None, None) => Resolution::HostFallback,
            },
            Some(record) => record
                .owner_id
                .as_ref()
                .and_then(|owner| self.documents.confirmation_page(owner, request.as_str()))
                .map_or(Resolution::HostFallback, Resolution::Confirm),
        };
        drop(guard);

        if resolution == Resolution::HostFallback {
            emit_message(CHANNEL_RESOLVER_FALLBACK_USED, request.as_str().len());
        }
        resolution
    }

    /// Resolve a raw URI; unparsable input is left to the host.
    pub fn resolve_str(&self, raw: &str) -> Resolution {
        match SchemeRequest::parse(raw) {
            Ok(request) => self.resolve(&request),
            Err(_) => Resolution::HostFallback,
        }
    }

    pub fn record(&self) -> Option<RegistrationRecord> {
        self.record.read().clone()
    }

    pub fn is_registered(&self) -> bool {
        self.record.read().is_some()
    }
}

impl std::fmt::Debug for SchemeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeResolver")
            .field("record", &*self.record.read())
            .field("documents", &self.documents)
            .finish_non_exhaustive()
    }
}
