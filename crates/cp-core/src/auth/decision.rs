//! IO capability → authentication method mapping.
//!
//! The table is the one in Core v5.1, Vol 3, Part C, 5.2.2.6 (IO capability
//! mapping to authentication stage 1), kept as data so every cell can be
//! checked against the document directly.
//!
//! ```text
//!                 responder →
//! initiator ↓     DisplayOnly   DisplayYesNo  KeyboardOnly  NoInputNoOutput
//! DisplayOnly     auto   (U)    auto   (U)    passkey (A)   auto   (U)
//! DisplayYesNo    ui-nc  (U)    ui-nc  (A)    passkey (A)   ui-nc  (U)
//! KeyboardOnly    passkey(A)    passkey(A)    passkey (A)   auto   (U)
//! NoInputNoOutput auto   (U)    auto   (U)    auto    (U)   auto   (U)
//! ```

use serde::{Deserialize, Serialize};

use crate::hci::IoCapability;

/// What the local side does when the controller asks for user confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationAction {
    /// Numeric comparison with no side able to confirm: accept immediately
    AutoConfirmNow,
    /// Numeric comparison shown to the user for a yes/no answer
    RequestUiNumericComparison,
    /// Passkey entry on the keyboard side
    RequestUiPasskeyEntry,
}

/// Result of a table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticationDecision {
    pub action: AuthenticationAction,
    /// Whether the resulting link key is MITM protected
    pub authenticated: bool,
}

impl AuthenticationDecision {
    const fn auto() -> Self {
        Self {
            action: AuthenticationAction::AutoConfirmNow,
            authenticated: false,
        }
    }

    const fn numeric_comparison(authenticated: bool) -> Self {
        Self {
            action: AuthenticationAction::RequestUiNumericComparison,
            authenticated,
        }
    }

    const fn passkey() -> Self {
        Self {
            action: AuthenticationAction::RequestUiPasskeyEntry,
            authenticated: true,
        }
    }
}

const AUTO: AuthenticationDecision = AuthenticationDecision::auto();
const NC_U: AuthenticationDecision = AuthenticationDecision::numeric_comparison(false);
const NC_A: AuthenticationDecision = AuthenticationDecision::numeric_comparison(true);
const PKE: AuthenticationDecision = AuthenticationDecision::passkey();

/// Indexed `[initiator][responder]` by the wire value of [`IoCapability`].
pub const AUTHENTICATION_TABLE: [[AuthenticationDecision; 4]; 4] = [
    // DisplayOnly initiator
    [AUTO, AUTO, PKE, AUTO],
    // DisplayYesNo initiator
    [NC_U, NC_A, PKE, NC_U],
    // KeyboardOnly initiator
    [PKE, PKE, PKE, AUTO],
    // NoInputNoOutput initiator
    [AUTO, AUTO, AUTO, AUTO],
];

/// Look up the authentication method for an ordered capability pair.
pub fn decide(initiator: IoCapability, responder: IoCapability) -> AuthenticationDecision {
    AUTHENTICATION_TABLE[initiator.index()][responder.index()]
}
