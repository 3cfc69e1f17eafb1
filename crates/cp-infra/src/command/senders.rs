use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use cp_core::ports::CommandSenderPort;
use cp_core::HciCommand;

/// Keeps every command it is given, in order, and logs it.
///
/// 没有控制器时的命令出口: 记录并打印每条命令。
#[derive(Debug, Clone, Default)]
pub struct RecordingCommandSender {
    sent: Arc<Mutex<Vec<HciCommand>>>,
}

impl RecordingCommandSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<HciCommand> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl CommandSenderPort for RecordingCommandSender {
    async fn send(&self, command: HciCommand) -> anyhow::Result<()> {
        info!(
            op_code = command.op_code().as_u16(),
            bd_addr = %command.bd_addr(),
            "Sending: {}",
            command.op_code()
        );
        self.sent.lock().await.push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_core::BdAddr;

    #[tokio::test]
    async fn recording_sender_keeps_order() {
        let sender = RecordingCommandSender::new();
        let peer = BdAddr::new([9; 6]);
        sender
            .send(HciCommand::LinkKeyRequestNegativeReply { bd_addr: peer })
            .await
            .unwrap();
        sender
            .send(HciCommand::UserConfirmationRequestReply { bd_addr: peer })
            .await
            .unwrap();

        assert_eq!(
            sender.sent().await,
            vec![
                HciCommand::LinkKeyRequestNegativeReply { bd_addr: peer },
                HciCommand::UserConfirmationRequestReply { bd_addr: peer },
            ]
        );
    }
}
