use super::LocalParameters;
use crate::hci::{ErrorCode, HciEvent};
use crate::ids::ChannelId;
use crate::ports::{ConnectionFailure, RegistrationResult};

/// Lifecycle inputs: caller requests and channel provider continuations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// 调用方发起配对 (只能调用一次)
    Initiate(LocalParameters),
    RegistrationComplete { result: RegistrationResult },
    ConnectionOpened { channel: ChannelId },
    ConnectionFailed { reason: ConnectionFailure },
    ChannelClosed { channel: ChannelId, reason: ErrorCode },
    /// 取消 (幂等)
    Cancel,
    Unregistered,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Initiate(_) => "Initiate",
            LifecycleEvent::RegistrationComplete { .. } => "RegistrationComplete",
            LifecycleEvent::ConnectionOpened { .. } => "ConnectionOpened",
            LifecycleEvent::ConnectionFailed { .. } => "ConnectionFailed",
            LifecycleEvent::ChannelClosed { .. } => "ChannelClosed",
            LifecycleEvent::Cancel => "Cancel",
            LifecycleEvent::Unregistered => "Unregistered",
        }
    }
}

/// One entry of a session's mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Lifecycle(LifecycleEvent),
    Hci(HciEvent),
}

impl SessionInput {
    pub fn name(&self) -> &'static str {
        match self {
            SessionInput::Lifecycle(event) => event.name(),
            SessionInput::Hci(event) => event.event_code().name(),
        }
    }
}

impl From<LifecycleEvent> for SessionInput {
    fn from(event: LifecycleEvent) -> Self {
        SessionInput::Lifecycle(event)
    }
}

impl From<HciEvent> for SessionInput {
    fn from(event: HciEvent) -> Self {
        SessionInput::Hci(event)
    }
}
