//! Authentication method selection for Secure Simple Pairing.

mod decision;

pub use decision::{decide, AuthenticationAction, AuthenticationDecision, AUTHENTICATION_TABLE};
