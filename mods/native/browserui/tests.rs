/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use register_input::{Code, Modifiers};
use rstest::rstest;
use url::Url;

use super::*;
use crate::diagnostics::{
    CHANNEL_COORDINATOR_BROADCAST_REGISTER, CHANNEL_COORDINATOR_BROADCAST_RESET,
    CHANNEL_SHORTCUT_FIRED, DiagnosticsState, install_thread_sender,
};
use crate::input::BindingState;
use crate::protocols::Resolution;
use crate::protocols::resolver::DEFAULT_HOST_DOCUMENT;
use crate::test_utils::HostFixture;

#[test]
fn startup_registers_every_process_and_arms_shortcuts() {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    let addon = fixture.start_addon();
    child.pump();

    assert!(fixture.parent.resolver().is_registered());
    assert!(matches!(child.resolve("browserui://"), Resolution::Default(_)));
    assert!(
        addon
            .dispatchers()
            .iter()
            .all(|dispatcher| dispatcher.state() == BindingState::Attached)
    );
    assert_eq!(fixture.host.delayed_script_count(), 1);
}

#[test]
fn confirmed_endpoint_becomes_the_override_everywhere() {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    let addon = fixture.start_addon();
    let chrome = fixture.host.windows().open_window("browserui://");

    let mut page = fixture.open_install_page("browserui://custom1");
    page.install_requested().unwrap();
    assert_eq!(addon.pump_confirmations(), 1);
    fixture.pump(&[&child]);

    let expected = Url::parse("browserui://custom1").unwrap();
    assert_eq!(fixture.parent.resolve("browserui://"), Resolution::Override(expected.clone()));
    assert_eq!(child.resolve("browserui://"), Resolution::Override(expected.clone()));
    assert_eq!(chrome.reload_count(), 1);

    let late = fixture.host.spawn_process();
    late.pump();
    assert_eq!(late.resolve("browserui://"), Resolution::Override(expected));
}

#[test]
fn confirming_the_sentinel_resets_everywhere() {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    let addon = fixture.start_addon();

    addon.apply_confirmation(&ConfirmationMessage {
        uri: "http://localhost/ui".to_string(),
    });
    fixture.pump(&[&child]);

    fixture.open_install_page("browserui://").reset().unwrap();
    assert_eq!(addon.pump_confirmations(), 1);
    fixture.pump(&[&child]);

    let host_document = Resolution::Default(Url::parse(DEFAULT_HOST_DOCUMENT).unwrap());
    assert_eq!(fixture.parent.resolve("browserui://"), host_document);
    assert_eq!(child.resolve("browserui://"), host_document);
    assert!(fixture.history.snapshot().is_empty());

    let late = fixture.host.spawn_process();
    late.pump();
    assert_eq!(late.resolve("browserui://"), host_document);
}

#[test]
fn invalid_confirmations_are_ignored() {
    let fixture = HostFixture::new();
    let addon = fixture.start_addon();
    assert!(!addon.apply_confirmation(&ConfirmationMessage {
        uri: "not a uri".to_string()
    }));
}

#[test]
fn reload_shortcut_fires_once_with_many_windows() {
    let fixture = HostFixture::new();
    let windows: Vec<_> = (0..3)
        .map(|_| fixture.host.windows().open_window("browserui://"))
        .collect();
    let addon = fixture.start_addon();
    addon.apply_confirmation(&ConfirmationMessage {
        uri: "http://localhost/ui".to_string(),
    });
    let reloads_before: usize = windows.iter().map(|window| window.reload_count()).sum();

    let mut diagnostics = DiagnosticsState::new();
    let _guard = install_thread_sender(diagnostics.sender());
    fixture.host.windows().press_key(Code::KeyR, Modifiers::ALT);

    let reloads_after: usize = windows.iter().map(|window| window.reload_count()).sum();
    assert_eq!(reloads_after - reloads_before, windows.len());
    diagnostics.drain();
    assert_eq!(diagnostics.message_count(CHANNEL_SHORTCUT_FIRED), 1);
    assert_eq!(addon.dispatchers()[0].invocations(), 1);
}

#[test]
fn reset_shortcut_clears_override_and_broadcasts() {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    fixture.host.windows().open_window("browserui://");
    let addon = fixture.start_addon();
    addon.apply_confirmation(&ConfirmationMessage {
        uri: "http://localhost/ui".to_string(),
    });
    fixture.pump(&[&child]);

    let mut diagnostics = DiagnosticsState::new();
    let _guard = install_thread_sender(diagnostics.sender());
    fixture
        .host
        .windows()
        .press_key(Code::KeyR, Modifiers::CONTROL | Modifiers::ALT);
    fixture.pump(&[&child]);

    diagnostics.drain();
    assert_eq!(diagnostics.message_count(CHANNEL_COORDINATOR_BROADCAST_RESET), 1);
    assert_eq!(diagnostics.message_count(CHANNEL_COORDINATOR_BROADCAST_REGISTER), 0);
    let host_document = Resolution::Default(Url::parse(DEFAULT_HOST_DOCUMENT).unwrap());
    assert_eq!(fixture.parent.resolve("browserui://"), host_document);
    assert_eq!(child.resolve("browserui://"), host_document);
    assert_eq!(addon.dispatchers()[0].invocations(), 0);
}

#[test]
fn windows_opened_after_startup_get_shortcuts() {
    let fixture = HostFixture::new();
    let addon = fixture.start_addon();
    let window = fixture.host.windows().open_window("browserui://");
    assert_eq!(window.observer_count(), 2);

    fixture.host.windows().press_key(Code::KeyR, Modifiers::ALT);
    assert_eq!(addon.dispatchers()[0].invocations(), 1);
}

#[rstest]
#[case(ShutdownReason::AppShutdown)]
#[case(ShutdownReason::Disable)]
#[case(ShutdownReason::Upgrade)]
fn shutdown_unregisters_live_processes_and_stops_shortcuts(#[case] reason: ShutdownReason) {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    let window = fixture.host.windows().open_window("browserui://");
    let addon = fixture.start_addon();
    child.pump();

    addon.shutdown(reason);
    fixture.pump(&[&child]);

    assert!(!fixture.parent.resolver().is_registered());
    assert!(!child.resolver().is_registered());
    assert_eq!(window.observer_count(), 0);
    assert_eq!(fixture.host.windows().listener_count(), 0);
    assert_eq!(fixture.host.delayed_script_count(), 0);

    let late = fixture.host.spawn_process();
    late.pump();
    assert_eq!(late.resolve("browserui://"), Resolution::HostFallback);
}

#[test]
fn uninstall_resets_before_unregistering() {
    let fixture = HostFixture::new();
    let window = fixture.host.windows().open_window("browserui://");
    let addon = fixture.start_addon();
    addon.apply_confirmation(&ConfirmationMessage {
        uri: "http://localhost/ui".to_string(),
    });
    let reloads = window.reload_count();

    addon.shutdown(ShutdownReason::Uninstall);
    // The reset happens in the parent before the unregister script runs.
    assert_eq!(window.reload_count(), reloads + 1);
    assert_eq!(fixture.parent.resolver().record().and_then(|record| record.override_uri), None);

    fixture.parent.pump();
    assert!(!fixture.parent.resolver().is_registered());
}

#[test]
fn dropping_the_addon_tears_down() {
    let fixture = HostFixture::new();
    let window = fixture.host.windows().open_window("browserui://");
    {
        let _addon = fixture.start_addon();
        assert_eq!(window.observer_count(), 2);
    }
    assert_eq!(window.observer_count(), 0);
    assert_eq!(fixture.host.delayed_script_count(), 0);
    fixture.parent.pump();
    assert!(!fixture.parent.resolver().is_registered());
}

#[test]
fn process_tearing_down_ignores_unregister() {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    let addon = fixture.start_addon();
    child.pump();

    child.begin_teardown();
    addon.shutdown(ShutdownReason::AppShutdown);
    assert_eq!(child.pump(), vec![crate::process::ScriptOutcome::StaleProcessState]);
}
