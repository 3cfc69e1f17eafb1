//! # cp-app
//!
//! Runs a [`cp_core::PairingSession`] in a single serialized execution
//! context and carries out the actions it returns against the ports.

pub mod handler;

pub use handler::{ClassicPairingHandler, HandlerError, PairingHandle, PairingHandlerDeps};
