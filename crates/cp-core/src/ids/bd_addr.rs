use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Bluetooth device address (BD_ADDR).
///
/// Stored most significant byte first, so `bytes()[0]` is the `AA` in
/// `AA:BB:CC:DD:EE:FF`. This is the identity a pairing session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BdAddr([u8; 6]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid device address '{0}', expected AA:BB:CC:DD:EE:FF")]
pub struct ParseBdAddrError(String);

impl BdAddr {
    pub const EMPTY: BdAddr = BdAddr([0; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl Display for BdAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl FromStr for BdAddr {
    type Err = ParseBdAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts
                .next()
                .filter(|p| p.len() == 2)
                .ok_or_else(|| ParseBdAddrError(s.to_string()))?;
            *byte = u8::from_str_radix(part, 16).map_err(|_| ParseBdAddrError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(ParseBdAddrError(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; 6]> for BdAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl Serialize for BdAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BdAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
