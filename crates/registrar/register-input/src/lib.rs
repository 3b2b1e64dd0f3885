/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Key chord vocabulary for global input bindings.
//!
//! A chord is a physical key code plus an exact modifier set. Chords are
//! written in preferences as `"alt+R"` or `"ctrl+alt+R"` and matched against
//! incoming key events on the tracked modifiers only, so lock keys never
//! change whether a binding fires.

use std::fmt;
use std::str::FromStr;

pub use keyboard_types::{Code, KeyState, Modifiers};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Modifiers that take part in chord matching.
pub const TRACKED_MODIFIERS: Modifiers = Modifiers::ALT
    .union(Modifiers::CONTROL)
    .union(Modifiers::SHIFT)
    .union(Modifiers::META);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    #[error("key chord `{0}` is empty or has an empty segment")]
    Empty(String),
    #[error("key chord `{0}` names no key")]
    MissingKey(String),
    #[error("key chord `{0}` names more than one key")]
    MultipleKeys(String),
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: Code,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(code: Code, modifiers: Modifiers) -> Self {
        Self {
            code,
            modifiers: modifiers & TRACKED_MODIFIERS,
        }
    }

    /// True when `code` is this chord's key and the tracked part of
    /// `modifiers` is exactly this chord's modifier set.
    pub fn matches(&self, code: Code, modifiers: Modifiers) -> bool {
        self.code == code && (modifiers & TRACKED_MODIFIERS) == self.modifiers
    }
}

fn parse_code(part: &str) -> Result<Code, ChordParseError> {
    let mut chars = part.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        let spelled = if ch.is_ascii_alphabetic() {
            Some(format!("Key{}", ch.to_ascii_uppercase()))
        } else if ch.is_ascii_digit() {
            Some(format!("Digit{ch}"))
        } else {
            None
        };
        if let Some(spelled) = spelled {
            return Code::from_str(&spelled)
                .map_err(|_| ChordParseError::UnknownKey(part.to_string()));
        }
    }

    Code::from_str(part).map_err(|_| ChordParseError::UnknownKey(part.to_string()))
}

impl FromStr for KeyChord {
    type Err = ChordParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut code = None;

        for part in raw.split('+').map(str::trim) {
            if part.is_empty() {
                return Err(ChordParseError::Empty(raw.to_string()));
            }
            match part.to_ascii_lowercase().as_str() {
                "alt" | "option" => modifiers |= Modifiers::ALT,
                "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
                "shift" => modifiers |= Modifiers::SHIFT,
                "meta" | "cmd" | "super" => modifiers |= Modifiers::META,
                _ => {
                    if code.is_some() {
                        return Err(ChordParseError::MultipleKeys(raw.to_string()));
                    }
                    code = Some(parse_code(part)?);
                }
            }
        }

        let code = code.ok_or_else(|| ChordParseError::MissingKey(raw.to_string()))?;
        Ok(Self::new(code, modifiers))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (Modifiers::CONTROL, "ctrl"),
            (Modifiers::ALT, "alt"),
            (Modifiers::SHIFT, "shift"),
            (Modifiers::META, "meta"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }

        let code = self.code.to_string();
        let short = code
            .strip_prefix("Key")
            .or_else(|| code.strip_prefix("Digit"))
            .filter(|rest| rest.len() == 1);
        f.write_str(short.unwrap_or(&code))
    }
}

impl Serialize for KeyChord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyChord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
