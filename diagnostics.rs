/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Structured diagnostics channel.
//!
//! Components emit [`DiagnosticEvent`]s tagged with a channel id; a single
//! process-wide crossbeam sender collects them. Nothing is recorded until a
//! sender is installed.

use std::sync::OnceLock;

use crossbeam_channel::{Receiver, Sender, unbounded};

pub const CHANNEL_RESOLVER_REGISTERED: &str = "browserui.resolver.registered";
pub const CHANNEL_RESOLVER_UNREGISTERED: &str = "browserui.resolver.unregistered";
pub const CHANNEL_RESOLVER_RESET: &str = "browserui.resolver.reset";
pub const CHANNEL_RESOLVER_RELOAD: &str = "browserui.resolver.reload";
pub const CHANNEL_RESOLVER_FALLBACK_USED: &str = "browserui.resolver.fallback_used";
pub const CHANNEL_COORDINATOR_BROADCAST_REGISTER: &str =
    "browserui.coordinator.broadcast_register";
pub const CHANNEL_COORDINATOR_BROADCAST_RESET: &str = "browserui.coordinator.broadcast_reset";
pub const CHANNEL_COORDINATOR_BROADCAST_UNREGISTER: &str =
    "browserui.coordinator.broadcast_unregister";
pub const CHANNEL_PROCEDURE_SKIPPED: &str = "browserui.procedure.skipped";
pub const CHANNEL_SHORTCUT_FIRED: &str = "browserui.shortcut.fired";
pub const CHANNEL_SHORTCUT_DEDUPED: &str = "browserui.shortcut.deduped";
pub const CHANNEL_INSTALL_CONFIRMED: &str = "browserui.install.confirmed";
pub const CHANNEL_HISTORY_APPENDED: &str = "browserui.history.appended";
pub const CHANNEL_HISTORY_REMOVED: &str = "browserui.history.removed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    MessageSent {
        channel_id: &'static str,
        byte_len: usize,
    },
}

impl DiagnosticEvent {
    pub fn channel_id(&self) -> &'static str {
        match self {
            Self::MessageSent { channel_id, .. } => channel_id,
        }
    }
}

static GLOBAL_DIAGNOSTICS_TX: OnceLock<Sender<DiagnosticEvent>> = OnceLock::new();

#[cfg(any(test, feature = "test-utils"))]
thread_local! {
    static TEST_DIAGNOSTICS_TX: std::cell::RefCell<Option<Sender<DiagnosticEvent>>> =
        const { std::cell::RefCell::new(None) };
}

/// Install the process-wide sender. Only the first call takes effect.
pub fn install_global_sender(sender: Sender<DiagnosticEvent>) {
    let _ = GLOBAL_DIAGNOSTICS_TX.set(sender);
}

/// Route this thread's events to `sender` until the returned guard drops.
#[cfg(any(test, feature = "test-utils"))]
pub fn install_thread_sender(sender: Sender<DiagnosticEvent>) -> ThreadSenderGuard {
    TEST_DIAGNOSTICS_TX.with(|slot| {
        *slot.borrow_mut() = Some(sender);
    });
    ThreadSenderGuard { _private: () }
}

#[cfg(any(test, feature = "test-utils"))]
pub struct ThreadSenderGuard {
    _private: (),
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for ThreadSenderGuard {
    fn drop(&mut self) {
        TEST_DIAGNOSTICS_TX.with(|slot| {
            slot.borrow_mut().take();
        });
    }
}

pub fn emit_event(event: DiagnosticEvent) {
    #[cfg(any(test, feature = "test-utils"))]
    {
        let mut event = Some(event);
        TEST_DIAGNOSTICS_TX.with(|slot| {
            if let Some(tx) = slot.borrow().as_ref()
                && let Some(payload) = event.take()
            {
                let _ = tx.send(payload);
            }
        });
        if let (Some(payload), Some(tx)) = (event, GLOBAL_DIAGNOSTICS_TX.get()) {
            let _ = tx.send(payload);
        }
    }

    #[cfg(not(any(test, feature = "test-utils")))]
    {
        if let Some(tx) = GLOBAL_DIAGNOSTICS_TX.get() {
            let _ = tx.send(event);
        }
    }
}

pub(crate) fn emit_message(channel_id: &'static str, byte_len: usize) {
    emit_event(DiagnosticEvent::MessageSent {
        channel_id,
        byte_len,
    });
}

/// Receiving side of a diagnostics channel with per-channel counters.
pub struct DiagnosticsState {
    event_tx: Sender<DiagnosticEvent>,
    event_rx: Receiver<DiagnosticEvent>,
    events: Vec<DiagnosticEvent>,
}

impl Default for DiagnosticsState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsState {
    pub fn new() -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            event_tx,
            event_rx,
            events: Vec::new(),
        }
    }

    pub fn sender(&self) -> Sender<DiagnosticEvent> {
        self.event_tx.clone()
    }

    /// Move pending events into the retained log and return how many arrived.
    pub fn drain(&mut self) -> usize {
        let before = self.events.len();
        self.events.extend(self.event_rx.try_iter());
        self.events.len() - before
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn message_count(&self, channel_id: &str) -> usize {
        self.events
            .iter()
            .filter(|event| event.channel_id() == channel_id)
            .count()
    }
}
