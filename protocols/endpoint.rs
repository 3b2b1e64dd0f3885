/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

pub const BROWSERUI_SCHEME: &str = "browserui";
/// The bare scheme. Selecting it means "no override".
pub const DEFAULT_UI_SENTINEL: &str = "browserui://";
/// Query parameter the install page reads its requested endpoint from.
pub const INSTALL_QUERY_PARAM: &str = "browserui";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint is empty")]
    Empty,
    #[error("endpoint `{raw}` is not a valid URI: {reason}")]
    Invalid { raw: String, reason: String },
}

/// A chrome document the operator can select.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UiEndpoint {
    Default,
    Custom(Url),
}

fn is_sentinel(raw: &str) -> bool {
    raw.split_once(':').is_some_and(|(scheme, rest)| {
        scheme.eq_ignore_ascii_case(BROWSERUI_SCHEME) && rest.chars().all(|ch| ch == '/')
    })
}

impl UiEndpoint {
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EndpointError::Empty);
        }
        if is_sentinel(trimmed) {
            return Ok(Self::Default);
        }

        Url::parse(trimmed)
            .map(Self::Custom)
            .map_err(|error| EndpointError::Invalid {
                raw: trimmed.to_string(),
                reason: error.to_string(),
            })
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Default => None,
            Self::Custom(url) => Some(url),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => DEFAULT_UI_SENTINEL,
            Self::Custom(url) => url.as_str(),
        }
    }
}

impl FromStr for UiEndpoint {
    type Err = EndpointError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for UiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UiEndpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UiEndpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

/// Identity of the add-on instance that owns a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
