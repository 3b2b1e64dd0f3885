/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Runtime chrome redirection through the `browserui://` scheme.
//!
//! The crate keeps a per-process scheme resolver in sync across every process
//! a host spawns, drives reload/reset from global key chords, and carries the
//! install/confirmation flow that feeds new endpoints into the resolver.

pub mod diagnostics;
pub mod host;
pub mod input;
pub mod install;
pub mod mods;
pub mod persistence;
pub mod prefs;
pub mod process;
pub mod protocols;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the process-wide `tracing` subscriber, which also forwards `log`
/// records. `filter` takes precedence over `RUST_LOG`; the fallback is `info`.
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let env_filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));

    // A second call keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
