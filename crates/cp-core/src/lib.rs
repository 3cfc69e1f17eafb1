//! # cp-core
//!
//! Core domain models and the pairing state machine for classic (BR/EDR)
//! Secure Simple Pairing.
//!
//! This crate contains pure logic without any infrastructure dependencies:
//! the session returns actions, the application layer (`cp-app`) executes them.

pub mod auth;
pub mod config;
pub mod hci;
pub mod ids;
pub mod ports;
pub mod security;
pub mod session;

// Re-export commonly used types at the crate root
pub use auth::{decide, AuthenticationAction, AuthenticationDecision};
pub use config::PairingConfig;
pub use hci::{
    AuthenticationRequirements, ErrorCode, EventCode, HciCommand, HciEvent, IoCapability,
    KeyType, KeypressNotificationType, LinkKey, OobDataPresent, OpCode,
};
pub use ids::{BdAddr, ChannelId, RegistrationId};
pub use ports::{Mailbox, MailboxError};
pub use security::SecurityRecord;
pub use session::{
    ContractViolation, LifecycleEvent, LocalParameters, PairingSession, SessionAction,
    SessionInput, SessionState,
};
