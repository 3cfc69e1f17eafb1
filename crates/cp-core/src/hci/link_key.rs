use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

pub const LINK_KEY_SIZE: usize = 16;

/// Shared secret established by pairing.
///
/// 链路密钥：
/// - Debug / Display 不输出真实内容
/// - 比较使用常数时间
/// - Drop 时清零内存
#[derive(Clone)]
pub struct LinkKey([u8; LINK_KEY_SIZE]);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseLinkKeyError {
    #[error("link key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("link key must be {LINK_KEY_SIZE} bytes, got {0}")]
    Length(usize),
}

impl LinkKey {
    pub const fn new(bytes: [u8; LINK_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    pub fn expose(&self) -> &[u8; LINK_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for LinkKey {
    type Err = ParseLinkKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let array: [u8; LINK_KEY_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseLinkKeyError::Length(bytes.len()))?;
        Ok(Self(array))
    }
}

impl PartialEq for LinkKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for LinkKey {}

impl fmt::Debug for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LinkKey([REDACTED])")
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for LinkKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Key type carried by a link key notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum KeyType {
    Combination = 0x00,
    DebugCombination = 0x03,
    UnauthenticatedP192 = 0x04,
    AuthenticatedP192 = 0x05,
    ChangedCombination = 0x06,
    UnauthenticatedP256 = 0x07,
    AuthenticatedP256 = 0x08,
}

impl KeyType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(KeyType::Combination),
            0x03 => Some(KeyType::DebugCombination),
            0x04 => Some(KeyType::UnauthenticatedP192),
            0x05 => Some(KeyType::AuthenticatedP192),
            0x06 => Some(KeyType::ChangedCombination),
            0x07 => Some(KeyType::UnauthenticatedP256),
            0x08 => Some(KeyType::AuthenticatedP256),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, KeyType::AuthenticatedP192 | KeyType::AuthenticatedP256)
    }
}
