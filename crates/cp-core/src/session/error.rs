use thiserror::Error;

use super::SessionState;
use crate::hci::EventCode;
use crate::ids::{BdAddr, ChannelId, RegistrationId};

/// A collaborator or caller broke the session's contract.
///
/// None of these are runtime conditions: they mean a routing or ordering bug
/// upstream, and the session must not continue with its state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("malformed {0} event")]
    MalformedEvent(EventCode),

    #[error("{code} for {actual} routed to session bound to {expected}")]
    AddressMismatch {
        code: EventCode,
        expected: BdAddr,
        actual: BdAddr,
    },

    #[error("{0} delivered before the pairing service was registered")]
    EventBeforeRegistration(EventCode),

    #[error("session already initiated (state {0})")]
    AlreadyInitiated(SessionState),

    #[error("session not initiated")]
    NotInitiated,

    #[error("{opened} opened while {held} is still held")]
    ChannelAlreadyHeld { held: ChannelId, opened: ChannelId },

    #[error("{completed} completed while {held} is still held")]
    RegistrationAlreadyHeld {
        held: RegistrationId,
        completed: RegistrationId,
    },

    #[error("close notification for {closed} but session holds {held:?}")]
    ChannelMismatch {
        closed: ChannelId,
        held: Option<ChannelId>,
    },

    #[error("{signal} is not expected in state {state}")]
    UnexpectedSignal {
        signal: &'static str,
        state: SessionState,
    },
}
