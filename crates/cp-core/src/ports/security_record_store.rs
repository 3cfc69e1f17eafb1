use async_trait::async_trait;
use thiserror::Error;

use crate::hci::{KeyType, LinkKey};
use crate::ids::BdAddr;
use crate::security::SecurityRecord;

#[derive(Debug, Error)]
pub enum SecurityRecordStoreError {
    #[error("no security record for {0}")]
    NotFound(BdAddr),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Security records keyed by device address.
///
/// Records are created and destroyed elsewhere; the pairing core only reads
/// them and updates the link key.
#[async_trait]
pub trait SecurityRecordStorePort: Send + Sync {
    async fn lookup(
        &self,
        address: &BdAddr,
    ) -> Result<Option<SecurityRecord>, SecurityRecordStoreError>;

    async fn set_link_key(
        &self,
        address: &BdAddr,
        link_key: LinkKey,
        key_type: KeyType,
    ) -> Result<(), SecurityRecordStoreError>;
}
