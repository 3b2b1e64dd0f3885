/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::protocols::SchemeResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process-{}", self.0)
    }
}

/// State one process hands to the procedures it runs.
#[derive(Debug)]
pub struct ProcessContext {
    id: ProcessId,
    resolver: SchemeResolver,
    tearing_down: AtomicBool,
}

impl ProcessContext {
    pub fn new(id: ProcessId, resolver: SchemeResolver) -> Self {
        Self {
            id,
            resolver,
            tearing_down: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn resolver(&self) -> &SchemeResolver {
        &self.resolver
    }

    pub fn begin_teardown(&self) {
        self.tearing_down.store(true, Ordering::Release);
    }

    pub fn is_tearing_down(&self) -> bool {
        self.tearing_down.load(Ordering::Acquire)
    }
}
