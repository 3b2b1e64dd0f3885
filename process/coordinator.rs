/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Keeps every process's resolver registered while the feature is active.
//!
//! Registration is re-run in full in each process rather than replicated as
//! shared state; `register-scheme` is idempotent, so replays are harmless.
//! Broadcasts are fire-and-forget.

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::diagnostics::{
    CHANNEL_COORDINATOR_BROADCAST_REGISTER, CHANNEL_COORDINATOR_BROADCAST_RESET,
    CHANNEL_COORDINATOR_BROADCAST_UNREGISTER, emit_message,
};
use crate::host::{ProcessBroadcaster, ScriptHandle};
use crate::process::procedures::ActivationScript;
use crate::protocols::{OwnerId, UiEndpoint};

pub struct ProcessCoordinator {
    broadcaster: Arc<dyn ProcessBroadcaster>,
    /// The persistent registration script new processes will replay.
    persistent: Mutex<Option<ScriptHandle>>,
}

impl ProcessCoordinator {
    pub fn new(broadcaster: Arc<dyn ProcessBroadcaster>) -> Self {
        Self {
            broadcaster,
            persistent: Mutex::new(None),
        }
    }

    /// Register in every live process and every process created later.
    pub fn broadcast_register(&self, target: Option<&UiEndpoint>, owner: Option<&OwnerId>) {
        if let Some(byte_len) = self.replace_persistent(&ActivationScript::register(target, owner)) {
            debug!(
                "broadcast register-scheme; target={:?}",
                target.map(UiEndpoint::as_str)
            );
            emit_message(CHANNEL_COORDINATOR_BROADCAST_REGISTER, byte_len);
        }
    }

    /// Clear the override in every live process and every process created
    /// later, leaving the scheme routed to the host's own document.
    pub fn broadcast_reset(&self, owner: Option<&OwnerId>) {
        if let Some(byte_len) = self.replace_persistent(&ActivationScript::reset(owner)) {
            debug!("broadcast reset-scheme");
            emit_message(CHANNEL_COORDINATOR_BROADCAST_RESET, byte_len);
        }
    }

    /// Withdraw the previous persistent script and load `script` in its
    /// place. Returns the encoded length.
    fn replace_persistent(&self, script: &ActivationScript) -> Option<usize> {
        let encoded = match script.encode() {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!("failed to encode {} script: {error}", script.procedure.as_str());
                return None;
            }
        };
        let byte_len = encoded.len();

        let mut persistent = self.persistent.lock();
        if let Some(previous) = persistent.take() {
            self.broadcaster.remove_delayed_process_script(previous);
        }
        *persistent = self.broadcaster.load_process_script(encoded, true);
        Some(byte_len)
    }

    /// Unregister in live processes only; later processes never replay a
    /// registration once it is withdrawn.
    pub fn broadcast_unregister(&self) {
        if let Some(previous) = self.persistent.lock().take() {
            self.broadcaster.remove_delayed_process_script(previous);
        }

        let script = match ActivationScript::unregister().encode() {
            Ok(script) => script,
            Err(error) => {
                warn!("failed to encode unregister-scheme script: {error}");
                return;
            }
        };
        let byte_len = script.len();
        self.broadcaster.load_process_script(script, false);

        debug!("broadcast unregister-scheme");
        emit_message(CHANNEL_COORDINATOR_BROADCAST_UNREGISTER, byte_len);
    }

    pub fn has_persistent_script(&self) -> bool {
        self.persistent.lock().is_some()
    }
}
