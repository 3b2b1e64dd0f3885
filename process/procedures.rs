/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Activation scripts and the procedures they name.
//!
//! A script is plain data: a procedure id plus literal parameters, encoded as
//! JSON before it crosses a process boundary. Each process looks the id up in
//! a [`ProcedureRegistry`] built from compile-time registrations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::process::context::ProcessContext;
use crate::protocols::{OwnerId, UiEndpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcedureId {
    RegisterScheme,
    ResetScheme,
    UnregisterScheme,
}

impl ProcedureId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegisterScheme => "register-scheme",
            Self::ResetScheme => "reset-scheme",
            Self::UnregisterScheme => "unregister-scheme",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) owner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationScript {
    pub(crate) procedure: ProcedureId,
    #[serde(default)]
    pub(crate) params: ActivationParams,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcedureError {
    #[error("activation script could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no procedure registered for `{0}`")]
    UnknownProcedure(&'static str),
    #[error("activation target `{target}` is invalid: {reason}")]
    InvalidTarget { target: String, reason: String },
}

impl ActivationScript {
    pub fn register(target: Option<&UiEndpoint>, owner: Option<&OwnerId>) -> Self {
        Self {
            procedure: ProcedureId::RegisterScheme,
            params: ActivationParams {
                target: target.map(|endpoint| endpoint.as_str().to_string()),
                owner_id: owner.map(|owner| owner.as_str().to_string()),
            },
        }
    }

    /// Registration with the override cleared, serving the host document.
    pub fn reset(owner: Option<&OwnerId>) -> Self {
        Self {
            procedure: ProcedureId::ResetScheme,
            params: ActivationParams {
                target: None,
                owner_id: owner.map(|owner| owner.as_str().to_string()),
            },
        }
    }

    pub fn unregister() -> Self {
        Self {
            procedure: ProcedureId::UnregisterScheme,
            params: ActivationParams::default(),
        }
    }

    pub fn procedure(&self) -> ProcedureId {
        self.procedure
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProcedureError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProcedureError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

pub(crate) type ProcedureFn = fn(&ProcessContext, &ActivationParams) -> Result<(), ProcedureError>;

pub(crate) struct ProcedureRegistration {
    pub(crate) id: ProcedureId,
    pub(crate) run: ProcedureFn,
}

inventory::collect!(ProcedureRegistration);

fn register_scheme(context: &ProcessContext, params: &ActivationParams) -> Result<(), ProcedureError> {
    let target = params
        .target
        .as_deref()
        .map(UiEndpoint::parse)
        .transpose()
        .map_err(|error| ProcedureError::InvalidTarget {
            target: params.target.clone().unwrap_or_default(),
            reason: error.to_string(),
        })?;
    let owner = params.owner_id.as_deref().map(OwnerId::new);
    context.resolver().register(target.as_ref(), owner.as_ref());
    Ok(())
}

fn reset_scheme(context: &ProcessContext, params: &ActivationParams) -> Result<(), ProcedureError> {
    let owner = params.owner_id.as_deref().map(OwnerId::new);
    context.resolver().register_reset(owner.as_ref());
    Ok(())
}

fn unregister_scheme(context: &ProcessContext, _params: &ActivationParams) -> Result<(), ProcedureError> {
    context.resolver().unregister();
    Ok(())
}

inventory::submit! {
    ProcedureRegistration {
        id: ProcedureId::RegisterScheme,
        run: register_scheme,
    }
}

inventory::submit! {
    ProcedureRegistration {
        id: ProcedureId::ResetScheme,
        run: reset_scheme,
    }
}

inventory::submit! {
    ProcedureRegistration {
        id: ProcedureId::UnregisterScheme,
        run: unregister_scheme,
    }
}

/// Procedures known to this binary, keyed by id.
#[derive(Clone)]
pub struct ProcedureRegistry {
    procedures: HashMap<ProcedureId, ProcedureFn>,
}

impl ProcedureRegistry {
    pub fn empty() -> Self {
        Self {
            procedures: HashMap::new(),
        }
    }

    pub fn discover() -> Self {
        let procedures = inventory::iter::<ProcedureRegistration>
            .into_iter()
            .map(|registration| (registration.id, registration.run))
            .collect();
        Self { procedures }
    }

    pub fn contains(&self, id: ProcedureId) -> bool {
        self.procedures.contains_key(&id)
    }

    pub fn run(&self, context: &ProcessContext, script: &ActivationScript) -> Result<(), ProcedureError> {
        let procedure = self
            .procedures
            .get(&script.procedure)
            .ok_or(ProcedureError::UnknownProcedure(script.procedure.as_str()))?;
        procedure(context, &script.params)
    }

    pub fn run_encoded(&self, context: &ProcessContext, bytes: &[u8]) -> Result<ProcedureId, ProcedureError> {
        let script = ActivationScript::decode(bytes)?;
        self.run(context, &script)?;
        Ok(script.procedure)
    }
}

impl std::fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.procedures.keys()).finish()
    }
}
