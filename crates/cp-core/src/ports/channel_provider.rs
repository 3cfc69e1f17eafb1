use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::Mailbox;
use crate::hci::ErrorCode;
use crate::ids::{BdAddr, ChannelId, RegistrationId};

/// Fixed channel identifier a service is registered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u16);

impl ServiceId {
    /// Last fixed channel (0x3F) minus one.
    pub const CLASSIC_PAIRING_TRIGGER: ServiceId = ServiceId(0x003E);
}

impl Default for ServiceId {
    fn default() -> Self {
        Self::CLASSIC_PAIRING_TRIGGER
    }
}

impl Display for ServiceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cid 0x{:04x}", self.0)
    }
}

/// Link security the channel provider must enforce before opening a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityPolicy {
    #[default]
    Best,
    AuthenticatedEncryptedTransport,
    EncryptedTransport,
    PlaintextTransportOk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    pub service_id: ServiceId,
    pub policy: SecurityPolicy,
}

/// Outcome of `register_service`, delivered through the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationResult {
    Success(RegistrationId),
    DuplicateService,
    InvalidService,
}

/// Why `connect_services` did not produce a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ConnectionFailure {
    #[error("no service registered")]
    NoServiceRegistered,
    #[error("all services already have a channel")]
    AllServicesHaveChannel,
    #[error("hci error {0}")]
    HciError(ErrorCode),
    #[error("channel provider error: {0}")]
    Provider(String),
}

/// Fixed channel registration and connection machinery.
///
/// Calls return as soon as the request is accepted; results arrive later as
/// `LifecycleEvent`s posted into the mailbox passed along:
///
/// - `register_service` → `RegistrationComplete`, and `ConnectionOpened` for
///   every channel opened for the service
/// - `connect_services` → `ConnectionFailed` on failure
/// - `subscribe_close` → `ChannelClosed`
/// - `unregister` → `Unregistered`
#[async_trait]
pub trait ChannelProviderPort: Send + Sync {
    async fn register_service(
        &self,
        registration: ServiceRegistration,
        mailbox: Mailbox,
    ) -> anyhow::Result<()>;

    async fn connect_services(&self, address: BdAddr, mailbox: Mailbox) -> anyhow::Result<()>;

    /// Take exclusive use of an open channel.
    async fn acquire(&self, channel: ChannelId) -> anyhow::Result<()>;

    /// Give up exclusive use; balances exactly one `acquire`.
    async fn release(&self, channel: ChannelId) -> anyhow::Result<()>;

    async fn subscribe_close(&self, channel: ChannelId, mailbox: Mailbox) -> anyhow::Result<()>;

    async fn unregister(&self, registration: RegistrationId, mailbox: Mailbox)
        -> anyhow::Result<()>;
}
