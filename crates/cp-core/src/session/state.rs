use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::ContractViolation;
use crate::config::PairingConfig;
use crate::hci::{AuthenticationRequirements, IoCapability, OobDataPresent};

/// Lifecycle state of a pairing session.
///
/// ```text
/// Idle
///  │ Initiate
///  ▼
/// AwaitingRegistration ── registration failed ──────────────┐
///  │ RegistrationComplete                                   │
///  ▼                                                        │
/// AwaitingConnection ── ConnectionFailed / Cancel ──┐       │
///  │ ConnectionOpened                               │       │
///  ▼                                                ▼       ▼
/// ChannelOpen ── ChannelClosed / SimplePairingComplete / Cancel
///  │
///  ▼
/// Terminating ── Unregistered ──► Terminated (completion fires)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    AwaitingRegistration,
    AwaitingConnection,
    ChannelOpen,
    Terminating,
    Terminated,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Terminated)
    }

    /// Terminating or terminated: cancel has already run.
    pub fn is_shutting_down(self) -> bool {
        matches!(self, SessionState::Terminating | SessionState::Terminated)
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Exclusively held optional resource.
///
/// `acquire` refuses to overwrite a held value and `release` hands the value
/// out exactly once, so every acquisition is balanced by one release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Held<T> {
    #[default]
    Vacant,
    Held(T),
}

impl<T: Copy> Held<T> {
    pub fn acquire(&mut self, value: T) -> Result<(), T> {
        match self {
            Held::Held(current) => Err(*current),
            Held::Vacant => {
                *self = Held::Held(value);
                Ok(())
            }
        }
    }

    pub fn release(&mut self) -> Option<T> {
        match std::mem::replace(self, Held::Vacant) {
            Held::Held(value) => Some(value),
            Held::Vacant => None,
        }
    }

    pub fn get(&self) -> Option<T> {
        match self {
            Held::Held(value) => Some(*value),
            Held::Vacant => None,
        }
    }

    pub fn is_held(&self) -> bool {
        matches!(self, Held::Held(_))
    }
}

/// Local side parameters, fixed when the session is initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalParameters {
    /// Whether the local side is the SSP initiator
    pub locally_initiated: bool,
    pub io_capability: IoCapability,
    pub oob_present: OobDataPresent,
    pub authentication_requirements: AuthenticationRequirements,
}

impl LocalParameters {
    pub fn from_config(config: &PairingConfig, locally_initiated: bool) -> Self {
        Self {
            locally_initiated,
            io_capability: config.local.io_capability,
            oob_present: config.local.oob_present,
            authentication_requirements: config.local.authentication_requirements,
        }
    }

    pub(crate) fn require(params: Option<&Self>) -> Result<&Self, ContractViolation> {
        params.ok_or(ContractViolation::NotInitiated)
    }
}
