/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use browserui::install::{CONFIRM_TOPIC, ConfirmationMessage, InstallOutcome, InstallSurface};
use browserui::persistence::{HistoryStore, JsonFileHistoryStore};
use browserui::protocols::Resolution;
use browserui::test_utils::HostFixture;
use std::sync::Arc;

#[test]
fn installing_custom1_into_an_empty_list() {
    let fixture = HostFixture::new();
    let observer = fixture.bus.subscribe(CONFIRM_TOPIC);

    let mut page = fixture.open_install_page("browserui://custom1");
    assert_eq!(page.install_requested().unwrap(), InstallOutcome::Appended);

    assert_eq!(fixture.history.snapshot(), vec!["browserui://custom1"]);
    assert_eq!(
        observer.try_next(),
        Some(ConfirmationMessage {
            uri: "browserui://custom1".to_string()
        })
    );
}

#[test]
fn installing_the_sentinel_resets_the_registration() {
    let fixture = HostFixture::new();
    let child = fixture.host.spawn_process();
    let addon = fixture.start_addon();
    let observer = fixture.bus.subscribe(CONFIRM_TOPIC);

    fixture
        .open_install_page("browserui://custom1")
        .install_requested()
        .unwrap();
    addon.pump_confirmations();
    fixture.pump(&[&child]);
    assert!(matches!(child.resolve("browserui://"), Resolution::Override(_)));

    let mut page = fixture.open_install_page("browserui://");
    assert_eq!(page.install("browserui://").unwrap(), InstallOutcome::DefaultRequested);
    assert_eq!(addon.pump_confirmations(), 1);
    fixture.pump(&[&child]);

    assert_eq!(fixture.history.snapshot(), vec!["browserui://custom1"]);
    let published: Vec<ConfirmationMessage> = observer.drain();
    assert_eq!(
        published.last().map(|message| message.uri.as_str()),
        Some("browserui://")
    );
    assert!(matches!(fixture.parent.resolve("browserui://"), Resolution::Default(_)));
    assert!(matches!(child.resolve("browserui://"), Resolution::Default(_)));
}

#[test]
fn removing_an_absent_endpoint_changes_nothing() {
    let fixture = HostFixture::new();
    let mut page = fixture.open_install_page("browserui://custom1");
    page.install_requested().unwrap();

    assert!(!page.remove("browserui://absent").unwrap());
    assert_eq!(fixture.history.snapshot(), vec!["browserui://custom1"]);
}

#[test]
fn removing_never_touches_the_active_registration() {
    let fixture = HostFixture::new();
    let addon = fixture.start_addon();
    let mut page = fixture.open_install_page("http://localhost/");
    page.install_requested().unwrap();
    addon.pump_confirmations();

    assert!(page.remove("http://localhost/").unwrap());
    fixture.pump(&[]);
    assert!(matches!(fixture.parent.resolve("browserui://"), Resolution::Override(_)));
}

#[test]
fn history_file_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileHistoryStore::new(dir.path().join("history.json")));
    let fixture = HostFixture::new();

    let mut page =
        InstallSurface::open("browserui://b", store.clone(), fixture.bus.clone()).unwrap();
    page.install_requested().unwrap();
    page.install("browserui://a").unwrap();

    let reopened = InstallSurface::open("browserui://", store.clone(), fixture.bus.clone()).unwrap();
    assert_eq!(reopened.history().entries(), ["browserui://b", "browserui://a"]);
    assert_eq!(store.load().unwrap(), vec!["browserui://b", "browserui://a"]);
}
