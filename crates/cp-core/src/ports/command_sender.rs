use async_trait::async_trait;

use crate::hci::HciCommand;

/// Outbound HCI command path. Fire-and-forget.
#[async_trait]
pub trait CommandSenderPort: Send + Sync {
    async fn send(&self, command: HciCommand) -> anyhow::Result<()>;
}
