//! Loopback channel provider
//!
//! 回环信道提供者: 所有请求立即在内存中完成, 结果直接投递回会话邮箱。
//! Stands in for the fixed channel manager when there is no controller.

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use cp_core::ports::{
    ChannelProviderPort, ConnectionFailure, RegistrationResult, ServiceId, ServiceRegistration,
};
use cp_core::{BdAddr, ChannelId, ErrorCode, LifecycleEvent, Mailbox, RegistrationId};

/// Call counters, for checking acquire/release balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopbackStats {
    pub registered: usize,
    pub acquired: usize,
    pub released: usize,
    pub unregistered: usize,
}

#[derive(Debug)]
struct Service {
    id: ServiceId,
    mailbox: Mailbox,
    channel: Option<ChannelId>,
}

#[derive(Debug)]
struct Channel {
    registration: RegistrationId,
    address: BdAddr,
    acquired: bool,
    close_subscriber: Option<Mailbox>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    services: HashMap<RegistrationId, Service>,
    channels: HashMap<ChannelId, Channel>,
    /// Closed under a user that has not released yet
    closed_while_acquired: HashSet<ChannelId>,
    stats: LoopbackStats,
}

impl State {
    fn mint(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoopbackChannelProvider {
    state: Arc<Mutex<State>>,
    fail_connections: Option<ErrorCode>,
}

impl LoopbackChannelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `connect_services` reports `ConnectionFailed` with `reason`.
    pub fn failing_connections(reason: ErrorCode) -> Self {
        Self {
            fail_connections: Some(reason),
            ..Self::default()
        }
    }

    pub async fn stats(&self) -> LoopbackStats {
        self.state.lock().await.stats
    }

    pub async fn open_channels(&self) -> usize {
        self.state.lock().await.channels.len()
    }

    /// Simulate the transport closing `channel` under the session.
    pub async fn close(&self, channel: ChannelId, reason: ErrorCode) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let closed = state
            .channels
            .remove(&channel)
            .ok_or_else(|| anyhow!("{channel} is not open"))?;
        if let Some(service) = state.services.get_mut(&closed.registration) {
            service.channel = None;
        }
        if closed.acquired {
            state.closed_while_acquired.insert(channel);
        }
        debug!(%channel, address = %closed.address, %reason, "channel closed");
        if let Some(mailbox) = closed.close_subscriber {
            mailbox.post_lifecycle(LifecycleEvent::ChannelClosed { channel, reason })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelProviderPort for LoopbackChannelProvider {
    async fn register_service(
        &self,
        registration: ServiceRegistration,
        mailbox: Mailbox,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .services
            .values()
            .any(|service| service.id == registration.service_id);
        let result = if duplicate {
            RegistrationResult::DuplicateService
        } else {
            let id = RegistrationId::new(state.mint());
            state.services.insert(
                id,
                Service {
                    id: registration.service_id,
                    mailbox: mailbox.clone(),
                    channel: None,
                },
            );
            state.stats.registered += 1;
            RegistrationResult::Success(id)
        };
        debug!(service = %registration.service_id, ?result, "service registration");
        mailbox.post_lifecycle(LifecycleEvent::RegistrationComplete { result })?;
        Ok(())
    }

    async fn connect_services(&self, address: BdAddr, mailbox: Mailbox) -> anyhow::Result<()> {
        if let Some(reason) = self.fail_connections {
            mailbox.post_lifecycle(LifecycleEvent::ConnectionFailed {
                reason: ConnectionFailure::HciError(reason),
            })?;
            return Ok(());
        }

        let mut state = self.state.lock().await;
        if state.services.is_empty() {
            mailbox.post_lifecycle(LifecycleEvent::ConnectionFailed {
                reason: ConnectionFailure::NoServiceRegistered,
            })?;
            return Ok(());
        }

        let pending: Vec<RegistrationId> = state
            .services
            .iter()
            .filter(|(_, service)| service.channel.is_none())
            .map(|(id, _)| *id)
            .collect();
        if pending.is_empty() {
            mailbox.post_lifecycle(LifecycleEvent::ConnectionFailed {
                reason: ConnectionFailure::AllServicesHaveChannel,
            })?;
            return Ok(());
        }

        for registration in pending {
            let channel = ChannelId::new(state.mint());
            state.channels.insert(
                channel,
                Channel {
                    registration,
                    address,
                    acquired: false,
                    close_subscriber: None,
                },
            );
            let Some(service) = state.services.get_mut(&registration) else {
                continue;
            };
            service.channel = Some(channel);
            debug!(%channel, %address, service = %service.id, "channel opened");
            service
                .mailbox
                .post_lifecycle(LifecycleEvent::ConnectionOpened { channel })?;
        }
        Ok(())
    }

    async fn acquire(&self, channel: ChannelId) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| anyhow!("{channel} is not open"))?;
        if entry.acquired {
            bail!("{channel} is already acquired");
        }
        entry.acquired = true;
        state.stats.acquired += 1;
        Ok(())
    }

    /// Releasing the only user drops the link, so the channel closes and the
    /// close subscriber hears about it.
    async fn release(&self, channel: ChannelId) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if state.closed_while_acquired.remove(&channel) {
            state.stats.released += 1;
            return Ok(());
        }
        match state.channels.get_mut(&channel) {
            Some(entry) if entry.acquired => entry.acquired = false,
            Some(_) => bail!("{channel} was not acquired"),
            None => bail!("{channel} is not open"),
        }
        state.stats.released += 1;
        drop(state);
        self.close(channel, ErrorCode::CONNECTION_TERMINATED_BY_LOCAL_HOST)
            .await
    }

    async fn subscribe_close(&self, channel: ChannelId, mailbox: Mailbox) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| anyhow!("{channel} is not open"))?;
        entry.close_subscriber = Some(mailbox);
        Ok(())
    }

    async fn unregister(
        &self,
        registration: RegistrationId,
        mailbox: Mailbox,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let service = state
            .services
            .remove(&registration)
            .ok_or_else(|| anyhow!("{registration} is not registered"))?;
        if let Some(channel) = service.channel {
            state.channels.remove(&channel);
        }
        state.stats.unregistered += 1;
        debug!(%registration, service = %service.id, "service unregistered");
        mailbox.post_lifecycle(LifecycleEvent::Unregistered)?;
        Ok(())
    }
}
