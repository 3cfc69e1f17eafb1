use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// HCI event codes of the events the pairing core consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventCode {
    EncryptionChange = 0x08,
    ChangeConnectionLinkKeyComplete = 0x09,
    MasterLinkKeyComplete = 0x0A,
    ReturnLinkKeys = 0x15,
    PinCodeRequest = 0x16,
    LinkKeyRequest = 0x17,
    LinkKeyNotification = 0x18,
    EncryptionKeyRefreshComplete = 0x30,
    IoCapabilityRequest = 0x31,
    IoCapabilityResponse = 0x32,
    UserConfirmationRequest = 0x33,
    UserPasskeyRequest = 0x34,
    RemoteOobDataRequest = 0x35,
    SimplePairingComplete = 0x36,
    UserPasskeyNotification = 0x3B,
    KeypressNotification = 0x3C,
}

impl EventCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            EventCode::EncryptionChange => "ENCRYPTION_CHANGE",
            EventCode::ChangeConnectionLinkKeyComplete => "CHANGE_CONNECTION_LINK_KEY_COMPLETE",
            EventCode::MasterLinkKeyComplete => "MASTER_LINK_KEY_COMPLETE",
            EventCode::ReturnLinkKeys => "RETURN_LINK_KEYS",
            EventCode::PinCodeRequest => "PIN_CODE_REQUEST",
            EventCode::LinkKeyRequest => "LINK_KEY_REQUEST",
            EventCode::LinkKeyNotification => "LINK_KEY_NOTIFICATION",
            EventCode::EncryptionKeyRefreshComplete => "ENCRYPTION_KEY_REFRESH_COMPLETE",
            EventCode::IoCapabilityRequest => "IO_CAPABILITY_REQUEST",
            EventCode::IoCapabilityResponse => "IO_CAPABILITY_RESPONSE",
            EventCode::UserConfirmationRequest => "USER_CONFIRMATION_REQUEST",
            EventCode::UserPasskeyRequest => "USER_PASSKEY_REQUEST",
            EventCode::RemoteOobDataRequest => "REMOTE_OOB_DATA_REQUEST",
            EventCode::SimplePairingComplete => "SIMPLE_PAIRING_COMPLETE",
            EventCode::UserPasskeyNotification => "USER_PASSKEY_NOTIFICATION",
            EventCode::KeypressNotification => "KEYPRESS_NOTIFICATION",
        }
    }
}

impl Display for EventCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// HCI command opcodes (OGF 0x01, link control) of the commands we emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum OpCode {
    LinkKeyRequestReply = 0x040B,
    LinkKeyRequestNegativeReply = 0x040C,
    IoCapabilityRequestReply = 0x042B,
    UserConfirmationRequestReply = 0x042C,
}

impl OpCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCode::LinkKeyRequestReply => "LINK_KEY_REQUEST_REPLY",
            OpCode::LinkKeyRequestNegativeReply => "LINK_KEY_REQUEST_NEGATIVE_REPLY",
            OpCode::IoCapabilityRequestReply => "IO_CAPABILITY_REQUEST_REPLY",
            OpCode::UserConfirmationRequestReply => "USER_CONFIRMATION_REQUEST_REPLY",
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// HCI status / reason code. Kept as the raw byte; only a handful of values
/// get a name for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    pub const SUCCESS: ErrorCode = ErrorCode(0x00);
    pub const AUTHENTICATION_FAILURE: ErrorCode = ErrorCode(0x05);
    pub const PIN_OR_KEY_MISSING: ErrorCode = ErrorCode(0x06);
    pub const CONNECTION_TIMEOUT: ErrorCode = ErrorCode(0x08);
    pub const REMOTE_USER_TERMINATED_CONNECTION: ErrorCode = ErrorCode(0x13);
    pub const CONNECTION_TERMINATED_BY_LOCAL_HOST: ErrorCode = ErrorCode(0x16);
    pub const PAIRING_NOT_ALLOWED: ErrorCode = ErrorCode(0x18);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    fn text(self) -> &'static str {
        match self {
            Self::SUCCESS => "SUCCESS",
            Self::AUTHENTICATION_FAILURE => "AUTHENTICATION_FAILURE",
            Self::PIN_OR_KEY_MISSING => "PIN_OR_KEY_MISSING",
            Self::CONNECTION_TIMEOUT => "CONNECTION_TIMEOUT",
            Self::REMOTE_USER_TERMINATED_CONNECTION => "REMOTE_USER_TERMINATED_CONNECTION",
            Self::CONNECTION_TERMINATED_BY_LOCAL_HOST => "CONNECTION_TERMINATED_BY_LOCAL_HOST",
            Self::PAIRING_NOT_ALLOWED => "PAIRING_NOT_ALLOWED",
            _ => "UNKNOWN",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02x})", self.text(), self.0)
    }
}
