use crate::auth::AuthenticationAction;
use crate::hci::{HciCommand, KeyType, LinkKey};
use crate::ids::{BdAddr, ChannelId, RegistrationId};
use crate::ports::ServiceRegistration;

/// Side effects produced by a session transition.
///
/// Executed in order by the handler in `cp-app`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    RegisterService(ServiceRegistration),
    ConnectServices {
        address: BdAddr,
    },
    AcquireChannel {
        channel: ChannelId,
    },
    SubscribeChannelClose {
        channel: ChannelId,
    },
    ReleaseChannel {
        channel: ChannelId,
    },
    Unregister {
        registration: RegistrationId,
    },
    SendCommand(HciCommand),
    /// 写入链路密钥 (只在收到 link key notification 时产生)
    StoreLinkKey {
        address: BdAddr,
        link_key: LinkKey,
        key_type: KeyType,
    },
    /// No UI consumer is wired; the handler records the intent only.
    RequestUserInteraction {
        address: BdAddr,
        action: AuthenticationAction,
        authenticated: bool,
        numeric_value: u32,
    },
    /// 会话结束,通知调用方 (每个会话只产生一次)
    Complete {
        address: BdAddr,
    },
}
