/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory chrome windows and key delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use register_input::{Code, Modifiers};

use crate::host::{
    ChromeWindow, KeyObserver, KeyPress, KeyPressToken, ListenerId, ObserverId, WindowId,
    WindowListener, WindowManager,
};
use crate::protocols::ChromeReloader;

pub struct HeadlessWindow {
    id: WindowId,
    location: Mutex<String>,
    reload_count: AtomicUsize,
    observers: Mutex<Vec<(ObserverId, Arc<dyn KeyObserver>)>>,
    next_observer: AtomicU64,
}

impl HeadlessWindow {
    fn new(id: WindowId, location: &str) -> Self {
        Self {
            id,
            location: Mutex::new(location.to_string()),
            reload_count: AtomicUsize::new(0),
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(0),
        }
    }

    pub fn navigate(&self, location: &str) {
        *self.location.lock() = location.to_string();
    }

    pub fn reload(&self) {
        self.reload_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reload_count(&self) -> usize {
        self.reload_count.load(Ordering::SeqCst)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn shows_scheme(&self, scheme: &str) -> bool {
        self.location
            .lock()
            .split_once(':')
            .is_some_and(|(prefix, _)| prefix.eq_ignore_ascii_case(scheme))
    }

    /// Hand `press` to every observer attached to this window.
    pub fn deliver(&self, press: &KeyPress) {
        let observers: Vec<_> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer.on_key(press);
        }
    }
}

impl ChromeWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn location(&self) -> String {
        self.location.lock().clone()
    }

    fn add_key_observer(&self, observer: Arc<dyn KeyObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::SeqCst) + 1);
        self.observers.lock().push((id, observer));
        id
    }

    fn remove_key_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }
}

#[derive(Default)]
struct WindowsInner {
    windows: Mutex<Vec<Arc<HeadlessWindow>>>,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn WindowListener>)>>,
    next_window: AtomicU64,
    next_listener: AtomicU64,
    next_token: AtomicU64,
}

/// The parent process's window list.
#[derive(Clone, Default)]
pub struct HeadlessWindows {
    inner: Arc<WindowsInner>,
}

impl HeadlessWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a window at `location`. Window listeners see it before it is
    /// returned.
    pub fn open_window(&self, location: &str) -> Arc<HeadlessWindow> {
        let id = WindowId(self.inner.next_window.fetch_add(1, Ordering::SeqCst) + 1);
        let window = Arc::new(HeadlessWindow::new(id, location));
        self.inner.windows.lock().push(window.clone());

        let listeners: Vec<_> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        let handle: Arc<dyn ChromeWindow> = window.clone();
        for listener in listeners {
            listener.on_window_opened(&handle);
        }
        window
    }

    pub fn close_window(&self, id: WindowId) -> bool {
        let mut windows = self.inner.windows.lock();
        let before = windows.len();
        windows.retain(|window| window.id != id);
        windows.len() != before
    }

    pub fn window_count(&self) -> usize {
        self.inner.windows.lock().len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    pub fn next_token(&self) -> KeyPressToken {
        KeyPressToken(self.inner.next_token.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// One physical key-down, delivered through every open window.
    pub fn press_key(&self, code: Code, modifiers: Modifiers) -> KeyPressToken {
        let press = KeyPress::down(self.next_token(), code, modifiers);
        self.deliver(&press);
        press.token
    }

    pub fn deliver(&self, press: &KeyPress) {
        let windows: Vec<_> = self.inner.windows.lock().clone();
        for window in windows {
            window.deliver(press);
        }
    }
}

impl WindowManager for HeadlessWindows {
    fn windows(&self) -> Vec<Arc<dyn ChromeWindow>> {
        self.inner
            .windows
            .lock()
            .iter()
            .map(|window| window.clone() as Arc<dyn ChromeWindow>)
            .collect()
    }

    fn add_window_listener(&self, listener: Arc<dyn WindowListener>) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::SeqCst) + 1);
        self.inner.listeners.lock().push((id, listener));
        id
    }

    fn remove_window_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

impl ChromeReloader for HeadlessWindows {
    fn reload_scheme_windows(&self, scheme: &str) -> usize {
        let windows: Vec<_> = self.inner.windows.lock().clone();
        let mut reloaded = 0;
        for window in windows.iter().filter(|window| window.shows_scheme(scheme)) {
            window.reload();
            reloaded += 1;
        }
        reloaded
    }
}
