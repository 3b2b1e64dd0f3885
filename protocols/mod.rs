/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The `browserui://` scheme: endpoints, the per-process resolver and its
//! protocol-handler face.

pub mod endpoint;
pub mod handler;
pub mod resolver;

pub use endpoint::{
    BROWSERUI_SCHEME, DEFAULT_UI_SENTINEL, EndpointError, INSTALL_QUERY_PARAM, OwnerId,
    UiEndpoint,
};
pub use handler::BrowserUiProtocolHandler;
pub use resolver::{
    ChromeReloader, DocumentLocator, NoChromeWindows, RegistrationRecord, Resolution,
    SchemeResolver,
};
