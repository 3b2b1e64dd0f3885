/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `tower` face of the resolver, for hosts that dispatch schemes through a
//! handler slot.

use std::future::{Ready, ready};
use std::task::{Context, Poll};

use register_protocol::{ProtocolError, SchemeRequest};
use tower::Service;

use crate::protocols::endpoint::BROWSERUI_SCHEME;
use crate::protocols::resolver::{Resolution, SchemeResolver};

#[derive(Debug, Clone)]
pub struct BrowserUiProtocolHandler {
    resolver: SchemeResolver,
}

impl BrowserUiProtocolHandler {
    pub fn new(resolver: SchemeResolver) -> Self {
        Self { resolver }
    }
}

impl Service<SchemeRequest> for BrowserUiProtocolHandler {
    type Response = Resolution;
    type Error = ProtocolError;
    type Future = Ready<Result<Resolution, ProtocolError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), ProtocolError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: SchemeRequest) -> Self::Future {
        if !request.has_scheme(BROWSERUI_SCHEME) {
            return ready(Err(ProtocolError::SchemeMismatch {
                expected: BROWSERUI_SCHEME.to_string(),
                found: request.scheme().to_string(),
            }));
        }
        ready(Ok(self.resolver.resolve(&request)))
    }
}
