/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Scheme request parsing and the handler contract for custom URL schemes.
//!
//! Handlers are `tower` services over [`SchemeRequest`]. Hosts that resolve
//! schemes synchronously drive them with [`call_now`].

use std::future::Ready;
use std::task::{Context, Poll, Waker};

use tower::Service;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid URI `{0}`")]
    InvalidUri(String),
    #[error("handler for `{expected}` cannot serve `{found}` requests")]
    SchemeMismatch { expected: String, found: String },
    #[error("protocol handler is not ready")]
    NotReady,
}

/// A request against a custom scheme, split once at the scheme separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeRequest {
    raw: String,
    scheme: String,
    remainder: String,
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

impl SchemeRequest {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        let Some((scheme, tail)) = trimmed.split_once(':') else {
            return Err(ProtocolError::InvalidUri(raw.to_string()));
        };
        if !is_valid_scheme(scheme) {
            return Err(ProtocolError::InvalidUri(raw.to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            scheme: scheme.to_ascii_lowercase(),
            remainder: tail.trim_start_matches('/').to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lower-cased scheme name.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Everything after `scheme:` with leading slashes removed.
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }

    /// A bare request (`scheme:`, `scheme://`) names no target of its own.
    pub fn is_bare(&self) -> bool {
        self.remainder.is_empty()
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        let parsed = Url::parse(&self.raw).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Contract for synchronous scheme handlers.
pub trait ProtocolHandler<R>:
    Service<SchemeRequest, Response = R, Error = ProtocolError, Future = Ready<Result<R, ProtocolError>>>
    + Send
{
}

impl<T, R> ProtocolHandler<R> for T where
    T: Service<
            SchemeRequest,
            Response = R,
            Error = ProtocolError,
            Future = Ready<Result<R, ProtocolError>>,
        > + Send
{
}

/// Drive a synchronous handler to completion without an executor.
pub fn call_now<H, R>(handler: &mut H, request: SchemeRequest) -> Result<R, ProtocolError>
where
    H: Service<
            SchemeRequest,
            Response = R,
            Error = ProtocolError,
            Future = Ready<Result<R, ProtocolError>>,
        >,
{
    let mut cx = Context::from_waker(Waker::noop());
    match handler.poll_ready(&mut cx) {
        Poll::Ready(Ok(())) => {}
        Poll::Ready(Err(error)) => return Err(error),
        Poll::Pending => return Err(ProtocolError::NotReady),
    }
    handler.call(request).into_inner()
}
