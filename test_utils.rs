/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fixtures shared by unit tests and the scenario suite.

use std::sync::Arc;

use crate::host::{HeadlessHost, HeadlessProcess};
use crate::input::ShortcutBinding;
use crate::install::{InstallSurface, MessageBus};
use crate::mods::native::browserui::{AddonServices, BrowserUiAddon};
use crate::persistence::MemoryHistoryStore;
use crate::protocols::OwnerId;

/// A headless host with its parent process, a message bus and an
/// in-memory history list.
pub struct HostFixture {
    pub host: HeadlessHost,
    pub parent: HeadlessProcess,
    pub bus: MessageBus,
    pub owner: OwnerId,
    pub history: Arc<MemoryHistoryStore>,
}

impl Default for HostFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl HostFixture {
    pub fn new() -> Self {
        let host = HeadlessHost::default();
        let parent = host.spawn_parent_process();
        Self {
            host,
            parent,
            bus: MessageBus::new(),
            owner: OwnerId::new("fixture-owner"),
            history: Arc::new(MemoryHistoryStore::new()),
        }
    }

    pub fn services(&self) -> AddonServices {
        AddonServices {
            owner: self.owner.clone(),
            broadcaster: Arc::new(self.host.clone()),
            windows: Arc::new(self.host.windows().clone()),
            resolver: self.parent.resolver().clone(),
            bus: self.bus.clone(),
            shortcuts: [ShortcutBinding::default_reload(), ShortcutBinding::default_reset()],
        }
    }

    /// Start the add-on and let the parent process run its registration.
    pub fn start_addon(&self) -> BrowserUiAddon {
        let addon = BrowserUiAddon::startup(self.services());
        self.parent.pump();
        addon
    }

    pub fn open_install_page(&self, location: &str) -> InstallSurface {
        InstallSurface::open(location, self.history.clone(), self.bus.clone())
            .expect("in-memory history always loads")
    }

    pub fn pump(&self, processes: &[&HeadlessProcess]) {
        self.parent.pump();
        for process in processes {
            process.pump();
        }
    }
}
