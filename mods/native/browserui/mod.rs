/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! browserui add-on lifecycle.
//!
//! Owns the coordinator, both shortcut dispatchers and the `confirm`
//! subscription for as long as the add-on is active, and guarantees they are
//! torn down on every exit path.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::host::{ProcessBroadcaster, WindowManager};
use crate::input::{ShortcutAction, ShortcutBinding, ShortcutCallback, ShortcutDispatcher};
use crate::install::{CONFIRM_TOPIC, ConfirmationMessage, MessageBus, Subscription};
use crate::process::ProcessCoordinator;
use crate::protocols::{OwnerId, SchemeResolver, UiEndpoint};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    AppShutdown,
    Disable,
    Uninstall,
    Upgrade,
    Downgrade,
}

/// Everything the add-on needs from its host.
pub struct AddonServices {
    pub owner: OwnerId,
    pub broadcaster: Arc<dyn ProcessBroadcaster>,
    pub windows: Arc<dyn WindowManager>,
    /// The parent process's resolver.
    pub resolver: SchemeResolver,
    pub bus: MessageBus,
    pub shortcuts: [ShortcutBinding; 2],
}

pub struct BrowserUiAddon {
    owner: OwnerId,
    resolver: SchemeResolver,
    coordinator: Arc<ProcessCoordinator>,
    dispatchers: Vec<ShortcutDispatcher>,
    confirmations: Subscription,
    active: bool,
}

fn run_shortcut(
    action: ShortcutAction,
    resolver: &SchemeResolver,
    coordinator: &ProcessCoordinator,
    owner: &OwnerId,
) {
    match action {
        ShortcutAction::Reload => {
            resolver.reload_ui();
        }
        ShortcutAction::Reset => {
            resolver.reset_ui();
            coordinator.broadcast_reset(Some(owner));
        }
    }
}

impl BrowserUiAddon {
    pub fn startup(services: AddonServices) -> Self {
        let AddonServices {
            owner,
            broadcaster,
            windows,
            resolver,
            bus,
            shortcuts,
        } = services;

        let coordinator = Arc::new(ProcessCoordinator::new(broadcaster));
        coordinator.broadcast_register(None, Some(&owner));

        let dispatchers = shortcuts
            .into_iter()
            .map(|binding| {
                let resolver = resolver.clone();
                let coordinator = coordinator.clone();
                let owner = owner.clone();
                let callback: ShortcutCallback = Arc::new(move |action: ShortcutAction| {
                    run_shortcut(action, &resolver, &coordinator, &owner);
                });
                let dispatcher = ShortcutDispatcher::new(binding, windows.clone(), callback);
                dispatcher.start();
                dispatcher
            })
            .collect();

        info!("browserui started for {owner}");
        Self {
            owner,
            resolver,
            coordinator,
            dispatchers,
            confirmations: bus.subscribe(CONFIRM_TOPIC),
            active: true,
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn coordinator(&self) -> &ProcessCoordinator {
        &self.coordinator
    }

    pub fn dispatchers(&self) -> &[ShortcutDispatcher] {
        &self.dispatchers
    }

    /// Apply every pending confirmation; returns how many were applied.
    pub fn pump_confirmations(&self) -> usize {
        if !self.active {
            return 0;
        }
        self.confirmations
            .drain::<ConfirmationMessage>()
            .iter()
            .filter(|message| self.apply_confirmation(message))
            .count()
    }

    /// A custom endpoint becomes the override everywhere; the sentinel
    /// resets every process to the host's own document while keeping the
    /// scheme routed.
    pub fn apply_confirmation(&self, message: &ConfirmationMessage) -> bool {
        let endpoint = match UiEndpoint::parse(&message.uri) {
            Ok(endpoint) => endpoint,
            Err(error) => {
                warn!("ignoring confirmation for `{}`: {error}", message.uri);
                return false;
            }
        };

        match endpoint {
            UiEndpoint::Default => {
                self.resolver.reset_ui();
                self.coordinator.broadcast_reset(Some(&self.owner));
            }
            UiEndpoint::Custom(_) => {
                self.resolver.register(Some(&endpoint), Some(&self.owner));
                self.resolver.reload_ui();
                self.coordinator
                    .broadcast_register(Some(&endpoint), Some(&self.owner));
            }
        }
        debug!("applied confirmation for {endpoint}");
        true
    }

    /// Tear down before returning: the forced reset when uninstalling, then
    /// unregistration in every live process, then both dispatchers.
    pub fn shutdown(mut self, reason: ShutdownReason) {
        self.teardown(reason);
    }

    fn teardown(&mut self, reason: ShutdownReason) {
        if !self.active {
            return;
        }
        self.active = false;

        if reason == ShutdownReason::Uninstall {
            self.resolver.reset_ui();
        }
        self.coordinator.broadcast_unregister();
        for dispatcher in &self.dispatchers {
            dispatcher.stop();
        }
        info!("browserui shut down ({reason:?})");
    }

    pub fn on_install(owner: &OwnerId) {
        debug!("browserui installed for {owner}");
    }

    pub fn on_uninstall(owner: &OwnerId) {
        debug!("browserui uninstalled for {owner}");
    }
}

impl Drop for BrowserUiAddon {
    fn drop(&mut self) {
        self.teardown(ShutdownReason::AppShutdown);
    }
}
