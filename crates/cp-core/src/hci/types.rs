use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// IO capability declared during Secure Simple Pairing.
///
/// Classic SSP knows four values; `KeyboardDisplay` only exists for LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum IoCapability {
    /// 只有显示屏
    DisplayOnly = 0x00,
    /// 显示屏 + 是/否按键
    DisplayYesNo = 0x01,
    /// 只有键盘
    KeyboardOnly = 0x02,
    /// 无输入无输出 (耳机等)
    NoInputNoOutput = 0x03,
}

impl IoCapability {
    pub const ALL: [IoCapability; 4] = [
        IoCapability::DisplayOnly,
        IoCapability::DisplayYesNo,
        IoCapability::KeyboardOnly,
        IoCapability::NoInputNoOutput,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(IoCapability::DisplayOnly),
            0x01 => Some(IoCapability::DisplayYesNo),
            0x02 => Some(IoCapability::KeyboardOnly),
            0x03 => Some(IoCapability::NoInputNoOutput),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Row/column index into the authentication table.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl Display for IoCapability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IoCapability::DisplayOnly => "DISPLAY_ONLY",
            IoCapability::DisplayYesNo => "DISPLAY_YES_NO",
            IoCapability::KeyboardOnly => "KEYBOARD_ONLY",
            IoCapability::NoInputNoOutput => "NO_INPUT_NO_OUTPUT",
        };
        f.write_str(name)
    }
}

/// OOB data presence flag of an IO capability exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OobDataPresent {
    #[default]
    NotPresent = 0x00,
    P192Present = 0x01,
    P256Present = 0x02,
    P192AndP256Present = 0x03,
}

impl OobDataPresent {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(OobDataPresent::NotPresent),
            0x01 => Some(OobDataPresent::P192Present),
            0x02 => Some(OobDataPresent::P256Present),
            0x03 => Some(OobDataPresent::P192AndP256Present),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Authentication requirements of an IO capability exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AuthenticationRequirements {
    NoBonding = 0x00,
    NoBondingMitmProtection = 0x01,
    DedicatedBonding = 0x02,
    DedicatedBondingMitmProtection = 0x03,
    GeneralBonding = 0x04,
    #[default]
    GeneralBondingMitmProtection = 0x05,
}

impl AuthenticationRequirements {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(AuthenticationRequirements::NoBonding),
            0x01 => Some(AuthenticationRequirements::NoBondingMitmProtection),
            0x02 => Some(AuthenticationRequirements::DedicatedBonding),
            0x03 => Some(AuthenticationRequirements::DedicatedBondingMitmProtection),
            0x04 => Some(AuthenticationRequirements::GeneralBonding),
            0x05 => Some(AuthenticationRequirements::GeneralBondingMitmProtection),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Odd values request MITM protection.
    pub fn mitm_required(self) -> bool {
        self.as_u8() & 0x01 != 0
    }

    pub fn bonding(self) -> bool {
        !matches!(
            self,
            AuthenticationRequirements::NoBonding
                | AuthenticationRequirements::NoBondingMitmProtection
        )
    }
}

/// Sub-kind of a keypress notification during passkey entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeypressNotificationType {
    EntryStarted = 0x00,
    DigitEntered = 0x01,
    DigitErased = 0x02,
    Cleared = 0x03,
    EntryCompleted = 0x04,
}

impl KeypressNotificationType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(KeypressNotificationType::EntryStarted),
            0x01 => Some(KeypressNotificationType::DigitEntered),
            0x02 => Some(KeypressNotificationType::DigitErased),
            0x03 => Some(KeypressNotificationType::Cleared),
            0x04 => Some(KeypressNotificationType::EntryCompleted),
            _ => None,
        }
    }
}

impl Display for KeypressNotificationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KeypressNotificationType::EntryStarted => "ENTRY_STARTED",
            KeypressNotificationType::DigitEntered => "DIGIT_ENTERED",
            KeypressNotificationType::DigitErased => "DIGIT_ERASED",
            KeypressNotificationType::Cleared => "CLEARED",
            KeypressNotificationType::EntryCompleted => "ENTRY_COMPLETED",
        };
        f.write_str(name)
    }
}
