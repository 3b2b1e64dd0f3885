/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory host with isolated processes.
//!
//! Every process owns its resolver and an inbox of encoded scripts. Scripts
//! reach a process only through its inbox and run when the process is pumped.
//! Persistent scripts are queued into a new process's inbox before the
//! process is returned, so they run ahead of anything else it does.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;
use parking_lot::Mutex;

use crate::host::windows::HeadlessWindows;
use crate::host::{ProcessBroadcaster, ScriptHandle};
use crate::process::{
    ProcedureRegistry, ProcessContext, ProcessId, ProcessRuntime, ScriptOutcome,
};
use crate::protocols::{
    ChromeReloader, DocumentLocator, NoChromeWindows, Resolution, SchemeResolver,
};

#[derive(Default)]
struct BroadcastState {
    next_process: u32,
    next_script: u64,
    inboxes: Vec<(ProcessId, Sender<Vec<u8>>)>,
    delayed: Vec<(ScriptHandle, Vec<u8>)>,
}

struct HostInner {
    documents: DocumentLocator,
    procedures: Arc<ProcedureRegistry>,
    windows: HeadlessWindows,
    state: Mutex<BroadcastState>,
}

#[derive(Clone)]
pub struct HeadlessHost {
    inner: Arc<HostInner>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(DocumentLocator::default())
    }
}

impl HeadlessHost {
    pub fn new(documents: DocumentLocator) -> Self {
        Self::with_procedures(documents, ProcedureRegistry::discover())
    }

    pub fn with_procedures(documents: DocumentLocator, procedures: ProcedureRegistry) -> Self {
        Self {
            inner: Arc::new(HostInner {
                documents,
                procedures: Arc::new(procedures),
                windows: HeadlessWindows::new(),
                state: Mutex::new(BroadcastState::default()),
            }),
        }
    }

    pub fn windows(&self) -> &HeadlessWindows {
        &self.inner.windows
    }

    /// The process that owns the chrome windows.
    pub fn spawn_parent_process(&self) -> HeadlessProcess {
        self.spawn_with_reloader(Arc::new(self.inner.windows.clone()))
    }

    pub fn spawn_process(&self) -> HeadlessProcess {
        self.spawn_with_reloader(Arc::new(NoChromeWindows))
    }

    fn spawn_with_reloader(&self, reloader: Arc<dyn ChromeReloader>) -> HeadlessProcess {
        let (sender, inbox) = unbounded();
        let mut state = self.inner.state.lock();
        state.next_process += 1;
        let id = ProcessId(state.next_process);

        for (_, script) in &state.delayed {
            let _ = sender.send(script.clone());
        }
        debug!("spawned {id} with {} delayed scripts", state.delayed.len());
        state.inboxes.push((id, sender));
        drop(state);

        let resolver = SchemeResolver::new(self.inner.documents.clone(), reloader);
        HeadlessProcess {
            runtime: ProcessRuntime::new(
                ProcessContext::new(id, resolver),
                self.inner.procedures.clone(),
            ),
            inbox,
        }
    }

    /// Processes the broadcaster still delivers to. A dropped process is
    /// forgotten on the next broadcast.
    pub fn live_process_count(&self) -> usize {
        self.inner.state.lock().inboxes.len()
    }

    pub fn delayed_script_count(&self) -> usize {
        self.inner.state.lock().delayed.len()
    }
}

impl ProcessBroadcaster for HeadlessHost {
    fn load_process_script(&self, script: Vec<u8>, persist: bool) -> Option<ScriptHandle> {
        let mut state = self.inner.state.lock();
        state.inboxes.retain(|(id, sender)| {
            let delivered = sender.send(script.clone()).is_ok();
            if !delivered {
                debug!("{id} is gone; dropping its inbox");
            }
            delivered
        });

        if !persist {
            return None;
        }
        state.next_script += 1;
        let handle = ScriptHandle(state.next_script);
        state.delayed.push((handle, script));
        Some(handle)
    }

    fn remove_delayed_process_script(&self, handle: ScriptHandle) {
        self.inner
            .state
            .lock()
            .delayed
            .retain(|(delayed, _)| *delayed != handle);
    }
}

/// One isolated process of a [`HeadlessHost`].
pub struct HeadlessProcess {
    runtime: ProcessRuntime,
    inbox: Receiver<Vec<u8>>,
}

impl HeadlessProcess {
    pub fn id(&self) -> ProcessId {
        self.runtime.context().id()
    }

    pub fn resolver(&self) -> &SchemeResolver {
        self.runtime.context().resolver()
    }

    /// Run every script waiting in the inbox, in arrival order.
    pub fn pump(&self) -> Vec<ScriptOutcome> {
        self.inbox
            .try_iter()
            .map(|script| self.runtime.execute(&script))
            .collect()
    }

    pub fn pending_scripts(&self) -> usize {
        self.inbox.len()
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        self.resolver().resolve_str(raw)
    }

    pub fn begin_teardown(&self) {
        self.runtime.context().begin_teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ActivationScript, ProcedureId};
    use crate::protocols::{OwnerId, UiEndpoint};

    fn register_script(target: &str) -> Vec<u8> {
        ActivationScript::register(Some(&UiEndpoint::parse(target).unwrap()), Some(&OwnerId::new("o")))
            .encode()
            .unwrap()
    }

    #[test]
    fn scripts_reach_live_processes_when_pumped() {
        let host = HeadlessHost::default();
        let first = host.spawn_process();
        let second = host.spawn_process();

        assert_eq!(host.load_process_script(register_script("http://a/"), false), None);
        assert!(!first.resolver().is_registered());

        assert_eq!(first.pump(), vec![ScriptOutcome::Ran(ProcedureId::RegisterScheme)]);
        assert_eq!(second.pump().len(), 1);
        assert!(first.resolver().is_registered());
        assert!(second.resolver().is_registered());
    }

    #[test]
    fn delayed_scripts_replay_into_new_processes_first() {
        let host = HeadlessHost::default();
        host.load_process_script(register_script("http://a/"), true);

        let late = host.spawn_process();
        assert_eq!(late.pending_scripts(), 1);
        late.pump();
        assert!(matches!(late.resolve("browserui://"), Resolution::Override(_)));
    }

    #[test]
    fn withdrawn_scripts_are_not_replayed() {
        let host = HeadlessHost::default();
        let handle = host
            .load_process_script(register_script("http://a/"), true)
            .unwrap();
        host.remove_delayed_process_script(handle);

        let late = host.spawn_process();
        assert_eq!(late.pending_scripts(), 0);
        assert_eq!(host.delayed_script_count(), 0);
    }

    #[test]
    fn dropped_processes_are_pruned() {
        let host = HeadlessHost::default();
        let kept = host.spawn_process();
        drop(host.spawn_process());

        host.load_process_script(register_script("http://a/"), false);
        assert_eq!(host.live_process_count(), 1);
        assert_eq!(kept.pump().len(), 1);
    }
}
