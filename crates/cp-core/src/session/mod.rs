//! Pairing session: lifecycle state machine and HCI event router.

mod action;
mod error;
mod event;
mod lifecycle;
mod router;
mod state;

pub use action::SessionAction;
pub use error::ContractViolation;
pub use event::{LifecycleEvent, SessionInput};
pub use lifecycle::PairingSession;
pub use state::{Held, LocalParameters, SessionState};
