/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Cross-process propagation of resolver state.

pub mod context;
pub mod coordinator;
pub mod procedures;

use std::sync::Arc;

use log::{debug, warn};

pub use context::{ProcessContext, ProcessId};
pub use coordinator::ProcessCoordinator;
pub use procedures::{
    ActivationParams, ActivationScript, ProcedureError, ProcedureId, ProcedureRegistry,
};

use crate::diagnostics::{CHANNEL_PROCEDURE_SKIPPED, emit_message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Ran(ProcedureId),
    /// The process was already tearing down.
    StaleProcessState,
    Skipped,
}

/// Runs activation scripts delivered to one process.
#[derive(Debug)]
pub(crate) struct ProcessRuntime {
    context: ProcessContext,
    procedures: Arc<ProcedureRegistry>,
}

impl ProcessRuntime {
    pub fn new(context: ProcessContext, procedures: Arc<ProcedureRegistry>) -> Self {
        Self { context, procedures }
    }

    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    /// Run one encoded script. Failures are logged and never propagate.
    pub fn execute(&self, script: &[u8]) -> ScriptOutcome {
        if self.context.is_tearing_down() {
            debug!("{} is tearing down; ignoring activation script", self.context.id());
            return ScriptOutcome::StaleProcessState;
        }

        match self.procedures.run_encoded(&self.context, script) {
            Ok(procedure) => {
                debug!("{} ran {}", self.context.id(), procedure.as_str());
                ScriptOutcome::Ran(procedure)
            }
            Err(error) => {
                warn!("{} skipped activation script: {error}", self.context.id());
                emit_message(CHANNEL_PROCEDURE_SKIPPED, script.len());
                ScriptOutcome::Skipped
            }
        }
    }
}
