/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Global reload/reset shortcuts.
//!
//! Bindings fire from any open chrome window regardless of focus. Chords
//! match on the exact tracked modifier set, so the reset chord (`ctrl+alt+R`)
//! never also fires the reload chord (`alt+R`).

pub mod dispatcher;

use register_input::{Code, KeyChord, Modifiers};

pub use dispatcher::{BindingState, ShortcutCallback, ShortcutDispatcher};

pub const BINDING_BROWSERUI_RELOAD: &str = "input.browserui.reload";
pub const BINDING_BROWSERUI_RESET: &str = "input.browserui.reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    Reload,
    Reset,
}

impl ShortcutAction {
    pub fn binding_id(self) -> &'static str {
        match self {
            Self::Reload => BINDING_BROWSERUI_RELOAD,
            Self::Reset => BINDING_BROWSERUI_RESET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub chord: KeyChord,
    pub action: ShortcutAction,
}

impl ShortcutBinding {
    pub fn new(chord: KeyChord, action: ShortcutAction) -> Self {
        Self { chord, action }
    }

    pub fn default_reload() -> Self {
        Self::new(KeyChord::new(Code::KeyR, Modifiers::ALT), ShortcutAction::Reload)
    }

    pub fn default_reset() -> Self {
        Self::new(
            KeyChord::new(Code::KeyR, Modifiers::CONTROL | Modifiers::ALT),
            ShortcutAction::Reset,
        )
    }
}
