//! Parsed views of the HCI events routed to a pairing session.
//!
//! Enum-valued parameters are kept as the raw wire byte so a view can report
//! whether the frame it came from was well formed (`is_valid`). Typed getters
//! return `None` for undecodable values.

use serde::{Deserialize, Serialize};

use super::{ErrorCode, EventCode, IoCapability, KeyType, KeypressNotificationType, LinkKey};
use crate::hci::{AuthenticationRequirements, OobDataPresent};
use crate::ids::BdAddr;

/// Connection handles are 12 bits, 0x0F00.. is reserved.
pub const MAX_CONNECTION_HANDLE: u16 = 0x0EFF;
/// Six decimal digits.
pub const MAX_NUMERIC_VALUE: u32 = 999_999;
/// 255 byte parameter limit, one byte count + 22 bytes per key.
pub const MAX_RETURNED_LINK_KEYS: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeConnectionLinkKeyComplete {
    pub status: ErrorCode,
    pub connection_handle: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterLinkKeyComplete {
    pub status: ErrorCode,
    pub connection_handle: u16,
    /// 0x00 semi-permanent, 0x01 temporary
    pub key_flag: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinCodeRequest {
    pub bd_addr: BdAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkKeyRequest {
    pub bd_addr: BdAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkKeyNotification {
    pub bd_addr: BdAddr,
    pub link_key: LinkKey,
    pub key_type: u8,
}

impl LinkKeyNotification {
    pub fn key_type(&self) -> Option<KeyType> {
        KeyType::from_u8(self.key_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCapabilityRequest {
    pub bd_addr: BdAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCapabilityResponse {
    pub bd_addr: BdAddr,
    pub io_capability: u8,
    pub oob_data_present: u8,
    pub authentication_requirements: u8,
}

impl IoCapabilityResponse {
    pub fn io_capability(&self) -> Option<IoCapability> {
        IoCapability::from_u8(self.io_capability)
    }

    pub fn oob_data_present(&self) -> Option<OobDataPresent> {
        OobDataPresent::from_u8(self.oob_data_present)
    }

    pub fn authentication_requirements(&self) -> Option<AuthenticationRequirements> {
        AuthenticationRequirements::from_u8(self.authentication_requirements)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfirmationRequest {
    pub bd_addr: BdAddr,
    pub numeric_value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPasskeyRequest {
    pub bd_addr: BdAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOobDataRequest {
    pub bd_addr: BdAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplePairingComplete {
    pub status: ErrorCode,
    pub bd_addr: BdAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnLinkKeys {
    pub keys: Vec<(BdAddr, LinkKey)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionChange {
    pub status: ErrorCode,
    pub connection_handle: u16,
    /// 0x00 off, 0x01 E0 or AES-CCM, 0x02 AES-CCM (BR/EDR)
    pub encryption_enabled: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKeyRefreshComplete {
    pub status: ErrorCode,
    pub connection_handle: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPasskeyNotification {
    pub bd_addr: BdAddr,
    pub passkey: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypressNotification {
    pub bd_addr: BdAddr,
    pub notification_type: u8,
}

impl KeypressNotification {
    pub fn notification_type(&self) -> Option<KeypressNotificationType> {
        KeypressNotificationType::from_u8(self.notification_type)
    }
}

/// The closed set of events a pairing session accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HciEvent {
    ChangeConnectionLinkKeyComplete(ChangeConnectionLinkKeyComplete),
    MasterLinkKeyComplete(MasterLinkKeyComplete),
    PinCodeRequest(PinCodeRequest),
    LinkKeyRequest(LinkKeyRequest),
    LinkKeyNotification(LinkKeyNotification),
    IoCapabilityRequest(IoCapabilityRequest),
    IoCapabilityResponse(IoCapabilityResponse),
    UserConfirmationRequest(UserConfirmationRequest),
    UserPasskeyRequest(UserPasskeyRequest),
    RemoteOobDataRequest(RemoteOobDataRequest),
    SimplePairingComplete(SimplePairingComplete),
    ReturnLinkKeys(ReturnLinkKeys),
    EncryptionChange(EncryptionChange),
    EncryptionKeyRefreshComplete(EncryptionKeyRefreshComplete),
    UserPasskeyNotification(UserPasskeyNotification),
    KeypressNotification(KeypressNotification),
}

impl HciEvent {
    pub fn event_code(&self) -> EventCode {
        match self {
            HciEvent::ChangeConnectionLinkKeyComplete(_) => {
                EventCode::ChangeConnectionLinkKeyComplete
            }
            HciEvent::MasterLinkKeyComplete(_) => EventCode::MasterLinkKeyComplete,
            HciEvent::PinCodeRequest(_) => EventCode::PinCodeRequest,
            HciEvent::LinkKeyRequest(_) => EventCode::LinkKeyRequest,
            HciEvent::LinkKeyNotification(_) => EventCode::LinkKeyNotification,
            HciEvent::IoCapabilityRequest(_) => EventCode::IoCapabilityRequest,
            HciEvent::IoCapabilityResponse(_) => EventCode::IoCapabilityResponse,
            HciEvent::UserConfirmationRequest(_) => EventCode::UserConfirmationRequest,
            HciEvent::UserPasskeyRequest(_) => EventCode::UserPasskeyRequest,
            HciEvent::RemoteOobDataRequest(_) => EventCode::RemoteOobDataRequest,
            HciEvent::SimplePairingComplete(_) => EventCode::SimplePairingComplete,
            HciEvent::ReturnLinkKeys(_) => EventCode::ReturnLinkKeys,
            HciEvent::EncryptionChange(_) => EventCode::EncryptionChange,
            HciEvent::EncryptionKeyRefreshComplete(_) => EventCode::EncryptionKeyRefreshComplete,
            HciEvent::UserPasskeyNotification(_) => EventCode::UserPasskeyNotification,
            HciEvent::KeypressNotification(_) => EventCode::KeypressNotification,
        }
    }

    /// Structural validity of the frame this view was parsed from.
    pub fn is_valid(&self) -> bool {
        match self {
            HciEvent::ChangeConnectionLinkKeyComplete(ev) => {
                ev.connection_handle <= MAX_CONNECTION_HANDLE
            }
            HciEvent::MasterLinkKeyComplete(ev) => {
                ev.connection_handle <= MAX_CONNECTION_HANDLE && ev.key_flag <= 0x01
            }
            HciEvent::LinkKeyNotification(ev) => ev.key_type().is_some(),
            HciEvent::IoCapabilityResponse(ev) => {
                ev.io_capability().is_some()
                    && ev.oob_data_present().is_some()
                    && ev.authentication_requirements().is_some()
            }
            HciEvent::UserConfirmationRequest(ev) => ev.numeric_value <= MAX_NUMERIC_VALUE,
            HciEvent::ReturnLinkKeys(ev) => ev.keys.len() <= MAX_RETURNED_LINK_KEYS,
            HciEvent::EncryptionChange(ev) => {
                ev.connection_handle <= MAX_CONNECTION_HANDLE && ev.encryption_enabled <= 0x02
            }
            HciEvent::EncryptionKeyRefreshComplete(ev) => {
                ev.connection_handle <= MAX_CONNECTION_HANDLE
            }
            HciEvent::UserPasskeyNotification(ev) => ev.passkey <= MAX_NUMERIC_VALUE,
            HciEvent::KeypressNotification(ev) => ev.notification_type().is_some(),
            HciEvent::PinCodeRequest(_)
            | HciEvent::LinkKeyRequest(_)
            | HciEvent::IoCapabilityRequest(_)
            | HciEvent::UserPasskeyRequest(_)
            | HciEvent::RemoteOobDataRequest(_)
            | HciEvent::SimplePairingComplete(_) => true,
        }
    }

    /// The peer address embedded in the event, if the event kind carries one.
    pub fn peer_address(&self) -> Option<BdAddr> {
        match self {
            HciEvent::PinCodeRequest(ev) => Some(ev.bd_addr),
            HciEvent::LinkKeyRequest(ev) => Some(ev.bd_addr),
            HciEvent::LinkKeyNotification(ev) => Some(ev.bd_addr),
            HciEvent::IoCapabilityRequest(ev) => Some(ev.bd_addr),
            HciEvent::IoCapabilityResponse(ev) => Some(ev.bd_addr),
            HciEvent::UserConfirmationRequest(ev) => Some(ev.bd_addr),
            HciEvent::UserPasskeyRequest(ev) => Some(ev.bd_addr),
            HciEvent::RemoteOobDataRequest(ev) => Some(ev.bd_addr),
            HciEvent::SimplePairingComplete(ev) => Some(ev.bd_addr),
            HciEvent::UserPasskeyNotification(ev) => Some(ev.bd_addr),
            HciEvent::KeypressNotification(ev) => Some(ev.bd_addr),
            HciEvent::ChangeConnectionLinkKeyComplete(_)
            | HciEvent::MasterLinkKeyComplete(_)
            | HciEvent::ReturnLinkKeys(_)
            | HciEvent::EncryptionChange(_)
            | HciEvent::EncryptionKeyRefreshComplete(_) => None,
        }
    }
}

macro_rules! impl_from_view {
    ($($view:ident),* $(,)?) => {
        $(
            impl From<$view> for HciEvent {
                fn from(view: $view) -> Self {
                    HciEvent::$view(view)
                }
            }
        )*
    };
}

impl_from_view!(
    ChangeConnectionLinkKeyComplete,
    MasterLinkKeyComplete,
    PinCodeRequest,
    LinkKeyRequest,
    LinkKeyNotification,
    IoCapabilityRequest,
    IoCapabilityResponse,
    UserConfirmationRequest,
    UserPasskeyRequest,
    RemoteOobDataRequest,
    SimplePairingComplete,
    ReturnLinkKeys,
    EncryptionChange,
    EncryptionKeyRefreshComplete,
    UserPasskeyNotification,
    KeypressNotification,
);
