/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! One binding fanned out over every chrome window.
//!
//! The binding attaches a key observer to each open window and to each
//! window opened while it is active. A press reaches the dispatcher once per
//! attached window; the last handled [`KeyPressToken`] makes sure only the
//! first delivery fires.

use std::sync::{Arc, Weak};

use log::debug;
use parking_lot::Mutex;

use crate::diagnostics::{CHANNEL_SHORTCUT_DEDUPED, CHANNEL_SHORTCUT_FIRED, emit_message};
use crate::host::{
    ChromeWindow, KeyObserver, KeyPress, KeyPressToken, ListenerId, ObserverId, WindowId,
    WindowListener, WindowManager,
};
use crate::input::{ShortcutAction, ShortcutBinding};

pub type ShortcutCallback = Arc<dyn Fn(ShortcutAction) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Inactive,
    Attached,
    /// The bound action is running.
    Armed,
}

struct Guard {
    state: BindingState,
    last_token: Option<KeyPressToken>,
    invocations: usize,
}

struct Attachment {
    window_id: WindowId,
    window: Weak<dyn ChromeWindow>,
    observer: ObserverId,
}

struct Shared {
    binding: ShortcutBinding,
    callback: ShortcutCallback,
    guard: Mutex<Guard>,
    attachments: Mutex<Vec<Attachment>>,
}

impl Shared {
    fn attach(self: &Arc<Self>, window: &Arc<dyn ChromeWindow>) {
        let window_id = window.id();
        let mut attachments = self.attachments.lock();
        attachments.retain(|attachment| attachment.window.strong_count() > 0);
        if attachments.iter().any(|attachment| attachment.window_id == window_id) {
            return;
        }
        let observer = window.add_key_observer(Arc::new(BindingObserver(self.clone())));
        attachments.push(Attachment {
            window_id,
            window: Arc::downgrade(window),
            observer,
        });
    }

    fn handle(&self, press: &KeyPress) {
        if !press.is_initial_press() || !self.binding.chord.matches(press.code, press.modifiers) {
            return;
        }

        {
            let mut guard = self.guard.lock();
            if guard.state != BindingState::Attached {
                return;
            }
            if guard.last_token.is_some_and(|last| press.token <= last) {
                emit_message(CHANNEL_SHORTCUT_DEDUPED, 0);
                return;
            }
            guard.last_token = Some(press.token);
            guard.state = BindingState::Armed;
            guard.invocations += 1;
        }

        debug!("{} fired by {}", self.binding.action.binding_id(), self.binding.chord);
        emit_message(CHANNEL_SHORTCUT_FIRED, self.binding.action.binding_id().len());
        (self.callback)(self.binding.action);

        let mut guard = self.guard.lock();
        if guard.state == BindingState::Armed {
            guard.state = BindingState::Attached;
        }
    }
}

struct BindingObserver(Arc<Shared>);

impl KeyObserver for BindingObserver {
    fn on_key(&self, press: &KeyPress) {
        self.0.handle(press);
    }
}

struct AttachOnOpen(Arc<Shared>);

impl WindowListener for AttachOnOpen {
    fn on_window_opened(&self, window: &Arc<dyn ChromeWindow>) {
        self.0.attach(window);
    }
}

/// Owned handle for one live binding. Dropping it detaches everything.
pub struct ShortcutDispatcher {
    shared: Arc<Shared>,
    windows: Arc<dyn WindowManager>,
    listener: Mutex<Option<ListenerId>>,
}

impl ShortcutDispatcher {
    pub fn new(
        binding: ShortcutBinding,
        windows: Arc<dyn WindowManager>,
        callback: ShortcutCallback,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                binding,
                callback,
                guard: Mutex::new(Guard {
                    state: BindingState::Inactive,
                    last_token: None,
                    invocations: 0,
                }),
                attachments: Mutex::new(Vec::new()),
            }),
            windows,
            listener: Mutex::new(None),
        }
    }

    pub fn binding(&self) -> ShortcutBinding {
        self.shared.binding
    }

    /// Attach to every open window and to each window opened later.
    pub fn start(&self) {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return;
        }
        // Listen before walking the list so no window slips in between.
        *listener = Some(
            self.windows
                .add_window_listener(Arc::new(AttachOnOpen(self.shared.clone()))),
        );
        drop(listener);

        self.shared.guard.lock().state = BindingState::Attached;
        for window in self.windows.windows() {
            self.shared.attach(&window);
        }
        debug!(
            "{} started on {} windows",
            self.shared.binding.action.binding_id(),
            self.attached_window_count()
        );
    }

    /// Detach from every window and stop watching for new ones.
    pub fn stop(&self) {
        let Some(listener) = self.listener.lock().take() else {
            return;
        };
        self.windows.remove_window_listener(listener);
        self.shared.guard.lock().state = BindingState::Inactive;

        let attachments = std::mem::take(&mut *self.shared.attachments.lock());
        for attachment in attachments {
            if let Some(window) = attachment.window.upgrade() {
                window.remove_key_observer(attachment.observer);
            }
        }
        debug!("{} stopped", self.shared.binding.action.binding_id());
    }

    pub fn state(&self) -> BindingState {
        self.shared.guard.lock().state
    }

    pub fn invocations(&self) -> usize {
        self.shared.guard.lock().invocations
    }

    pub fn attached_window_count(&self) -> usize {
        self.shared
            .attachments
            .lock()
            .iter()
            .filter(|attachment| attachment.window.strong_count() > 0)
            .count()
    }
}

impl Drop for ShortcutDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
