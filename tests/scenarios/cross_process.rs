/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use browserui::install::ConfirmationMessage;
use browserui::mods::native::browserui::ShutdownReason;
use browserui::process::ProcessCoordinator;
use browserui::protocols::{OwnerId, Resolution, UiEndpoint};
use browserui::test_utils::HostFixture;
use std::sync::Arc;
use url::Url;

#[test]
fn process_created_after_broadcast_resolves_without_further_calls() {
    let fixture = HostFixture::new();
    let coordinator = ProcessCoordinator::new(Arc::new(fixture.host.clone()));
    let target = UiEndpoint::parse("http://localhost:8000/ui.html").unwrap();

    coordinator.broadcast_register(Some(&target), Some(&OwnerId::new("owner")));

    let late = fixture.host.spawn_process();
    late.pump();
    assert_eq!(
        late.resolve("browserui://"),
        Resolution::Override(Url::parse("http://localhost:8000/ui.html").unwrap())
    );
}

#[test]
fn every_process_follows_the_latest_registration() {
    let fixture = HostFixture::new();
    let early: Vec<_> = (0..3).map(|_| fixture.host.spawn_process()).collect();
    let addon = fixture.start_addon();

    for uri in ["http://one/", "http://two/", "http://three/"] {
        addon.apply_confirmation(&ConfirmationMessage {
            uri: uri.to_string(),
        });
    }
    let late = fixture.host.spawn_process();
    let all: Vec<_> = early.iter().chain(std::iter::once(&late)).collect();
    fixture.pump(&all);

    let expected = Resolution::Override(Url::parse("http://three/").unwrap());
    assert_eq!(fixture.parent.resolve("browserui://"), expected);
    for process in all {
        assert_eq!(process.resolve("browserui://"), expected);
    }
    // Only the latest registration is replayed into new processes.
    assert_eq!(fixture.host.delayed_script_count(), 1);
}

#[test]
fn late_process_never_registers_after_shutdown() {
    let fixture = HostFixture::new();
    let addon = fixture.start_addon();
    addon.apply_confirmation(&ConfirmationMessage {
        uri: "http://localhost/".to_string(),
    });
    addon.shutdown(ShutdownReason::Disable);

    let late = fixture.host.spawn_process();
    assert_eq!(late.pending_scripts(), 0);
    assert_eq!(late.resolve("browserui://"), Resolution::HostFallback);
}

#[test]
fn requests_for_concrete_endpoints_open_the_confirmation_page() {
    let fixture = HostFixture::new();
    let _addon = fixture.start_addon();

    let Resolution::Confirm(page) = fixture.parent.resolve("browserui://custom1") else {
        panic!("expected the confirmation page");
    };
    let surface = fixture.open_install_page(page.as_str());
    assert_eq!(surface.requested().as_str(), "browserui://custom1");
    assert!(surface.offers_install());
}
