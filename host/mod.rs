/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Ports onto the embedding host.
//!
//! The host owns processes, chrome windows and key delivery. The crate only
//! talks to it through these traits; [`headless`] implements them in memory.

pub mod headless;
pub mod windows;

use std::sync::Arc;

use register_input::{Code, KeyState, Modifiers};

pub use headless::{HeadlessHost, HeadlessProcess};
pub use windows::{HeadlessWindow, HeadlessWindows};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Identity of one physical key press. Every delivery of the same press
/// carries the same token; later presses carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPressToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub token: KeyPressToken,
    pub code: Code,
    pub modifiers: Modifiers,
    pub state: KeyState,
    pub repeat: bool,
}

impl KeyPress {
    pub fn down(token: KeyPressToken, code: Code, modifiers: Modifiers) -> Self {
        Self {
            token,
            code,
            modifiers,
            state: KeyState::Down,
            repeat: false,
        }
    }

    /// Key-down that is not auto-repeat.
    pub fn is_initial_press(&self) -> bool {
        self.state == KeyState::Down && !self.repeat
    }
}

/// Runs scripts in the host's processes.
pub trait ProcessBroadcaster: Send + Sync {
    /// Run `script` once in every live process. With `persist`, also run it
    /// first thing in every process created afterward, until withdrawn.
    fn load_process_script(&self, script: Vec<u8>, persist: bool) -> Option<ScriptHandle>;

    fn remove_delayed_process_script(&self, handle: ScriptHandle);
}

pub trait KeyObserver: Send + Sync {
    fn on_key(&self, press: &KeyPress);
}

pub trait ChromeWindow: Send + Sync {
    fn id(&self) -> WindowId;

    fn location(&self) -> String;

    fn add_key_observer(&self, observer: Arc<dyn KeyObserver>) -> ObserverId;

    fn remove_key_observer(&self, id: ObserverId) -> bool;
}

pub trait WindowListener: Send + Sync {
    /// Called for each new window before it is handed to whoever opened it.
    fn on_window_opened(&self, window: &Arc<dyn ChromeWindow>);
}

pub trait WindowManager: Send + Sync {
    fn windows(&self) -> Vec<Arc<dyn ChromeWindow>>;

    fn add_window_listener(&self, listener: Arc<dyn WindowListener>) -> ListenerId;

    fn remove_window_listener(&self, id: ListenerId) -> bool;
}
