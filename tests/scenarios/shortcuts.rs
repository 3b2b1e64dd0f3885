/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use browserui::diagnostics::{
    CHANNEL_SHORTCUT_DEDUPED, CHANNEL_SHORTCUT_FIRED, DiagnosticsState, install_thread_sender,
};
use browserui::install::ConfirmationMessage;
use browserui::protocols::Resolution;
use browserui::test_utils::HostFixture;
use register_input::{Code, Modifiers};

#[test]
fn reload_press_through_every_window_reloads_once_each() {
    let fixture = HostFixture::new();
    let windows: Vec<_> = (0..4)
        .map(|_| fixture.host.windows().open_window("browserui://"))
        .collect();
    let addon = fixture.start_addon();
    addon.apply_confirmation(&ConfirmationMessage {
        uri: "http://localhost/".to_string(),
    });

    let mut diagnostics = DiagnosticsState::new();
    let _guard = install_thread_sender(diagnostics.sender());
    fixture.host.windows().press_key(Code::KeyR, Modifiers::ALT);
    diagnostics.drain();

    assert_eq!(diagnostics.message_count(CHANNEL_SHORTCUT_FIRED), 1);
    assert_eq!(diagnostics.message_count(CHANNEL_SHORTCUT_DEDUPED), windows.len() - 1);
    assert!(windows.iter().all(|window| window.reload_count() == 2));
}

#[test]
fn reset_press_clears_the_override_in_children() {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    fixture.host.windows().open_window("browserui://");
    let addon = fixture.start_addon();
    addon.apply_confirmation(&ConfirmationMessage {
        uri: "http://localhost/".to_string(),
    });
    fixture.pump(&[&child]);

    fixture
        .host
        .windows()
        .press_key(Code::KeyR, Modifiers::CONTROL | Modifiers::ALT);
    fixture.pump(&[&child]);

    let host_document = fixture.parent.resolver().documents().host_default_document().clone();
    assert_eq!(child.resolve("browserui://"), Resolution::Default(host_document));
    assert_eq!(addon.dispatchers()[1].invocations(), 1);
    assert_eq!(addon.dispatchers()[0].invocations(), 0);
}

#[test]
fn caps_lock_does_not_block_the_reload_chord() {
    let fixture = HostFixture::new();
    fixture.host.windows().open_window("browserui://");
    let addon = fixture.start_addon();

    fixture
        .host
        .windows()
        .press_key(Code::KeyR, Modifiers::ALT | Modifiers::CAPS_LOCK);
    assert_eq!(addon.dispatchers()[0].invocations(), 1);
}
