use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use cp_core::hci::{KeyType, LinkKey};
use cp_core::ports::{SecurityRecordStoreError, SecurityRecordStorePort};
use cp_core::{BdAddr, SecurityRecord};

/// 内存中的安全记录存储
///
/// Records are created by `insert`; the pairing core only updates link keys
/// of records that already exist.
#[derive(Debug, Default)]
pub struct InMemorySecurityRecordStore {
    records: RwLock<HashMap<BdAddr, SecurityRecord>>,
}

impl InMemorySecurityRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its address.
    pub async fn insert(&self, record: SecurityRecord) {
        self.records.write().await.insert(record.address(), record);
    }

    pub async fn get(&self, address: &BdAddr) -> Option<SecurityRecord> {
        self.records.read().await.get(address).cloned()
    }
}

#[async_trait]
impl SecurityRecordStorePort for InMemorySecurityRecordStore {
    async fn lookup(
        &self,
        address: &BdAddr,
    ) -> Result<Option<SecurityRecord>, SecurityRecordStoreError> {
        Ok(self.get(address).await)
    }

    async fn set_link_key(
        &self,
        address: &BdAddr,
        link_key: LinkKey,
        key_type: KeyType,
    ) -> Result<(), SecurityRecordStoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(address)
            .ok_or(SecurityRecordStoreError::NotFound(*address))?;
        record.set_link_key(link_key, key_type);
        debug!(%address, ?key_type, "link key stored");
        Ok(())
    }
}
