use crate::hci::{KeyType, LinkKey};
use crate::ids::BdAddr;

/// Per-device security record.
///
/// Owned by the record store, not by the pairing session: the session reads
/// it to answer link key requests and writes the key only when the peer
/// notifies a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRecord {
    address: BdAddr,
    bonded: bool,
    paired: bool,
    link_key: Option<(LinkKey, KeyType)>,
}

impl SecurityRecord {
    pub fn new(address: BdAddr) -> Self {
        Self {
            address,
            bonded: false,
            paired: false,
            link_key: None,
        }
    }

    /// A record restored from persistent storage with a bonded key.
    pub fn bonded(address: BdAddr, link_key: LinkKey, key_type: KeyType) -> Self {
        Self {
            address,
            bonded: true,
            paired: false,
            link_key: Some((link_key, key_type)),
        }
    }

    pub fn address(&self) -> BdAddr {
        self.address
    }

    pub fn is_bonded(&self) -> bool {
        self.bonded
    }

    pub fn is_paired(&self) -> bool {
        self.paired
    }

    pub fn set_bonded(&mut self, bonded: bool) {
        self.bonded = bonded;
    }

    pub fn set_paired(&mut self, paired: bool) {
        self.paired = paired;
    }

    pub fn link_key(&self) -> Option<&LinkKey> {
        self.link_key.as_ref().map(|(key, _)| key)
    }

    pub fn key_type(&self) -> Option<KeyType> {
        self.link_key.as_ref().map(|(_, key_type)| *key_type)
    }

    /// Store a link key, replacing any previous one.
    pub fn set_link_key(&mut self, link_key: LinkKey, key_type: KeyType) {
        self.link_key = Some((link_key, key_type));
    }
}
