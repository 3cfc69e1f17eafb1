//! HCI types consumed and produced by the pairing core.
//!
//! Frames are decoded by a lower layer; these are the already-parsed views
//! (events) and the parameters of the commands we emit.

mod codes;
mod commands;
mod events;
mod link_key;
mod types;

pub use codes::{ErrorCode, EventCode, OpCode};
pub use commands::HciCommand;
pub use events::{
    ChangeConnectionLinkKeyComplete, EncryptionChange, EncryptionKeyRefreshComplete, HciEvent,
    IoCapabilityRequest, IoCapabilityResponse, KeypressNotification, LinkKeyNotification,
    LinkKeyRequest, MasterLinkKeyComplete, PinCodeRequest, RemoteOobDataRequest, ReturnLinkKeys,
    SimplePairingComplete, UserConfirmationRequest, UserPasskeyNotification, UserPasskeyRequest,
    MAX_CONNECTION_HANDLE, MAX_NUMERIC_VALUE, MAX_RETURNED_LINK_KEYS,
};
pub use link_key::{KeyType, LinkKey, ParseLinkKeyError, LINK_KEY_SIZE};
pub use types::{AuthenticationRequirements, IoCapability, KeypressNotificationType, OobDataPresent};
