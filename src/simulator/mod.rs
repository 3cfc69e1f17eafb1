//! Scripted pairing run
//!
//! 用内存适配器跑一次完整配对: 对端按脚本依次发送 HCI 事件,
//! 每个事件投递后立即由处理器消费, 最后输出报告。

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::info;

use cp_app::{ClassicPairingHandler, PairingHandle, PairingHandlerDeps};
use cp_core::hci::{
    IoCapabilityRequest, IoCapabilityResponse, LinkKeyNotification, LinkKeyRequest,
    SimplePairingComplete, UserConfirmationRequest,
};
use cp_core::{
    decide, AuthenticationAction, AuthenticationDecision, AuthenticationRequirements, BdAddr,
    ErrorCode, HciCommand, HciEvent, IoCapability, KeyType, LinkKey, LocalParameters,
    OobDataPresent, PairingConfig, SecurityRecord, SessionState,
};
use cp_infra::{
    InMemorySecurityRecordStore, LoopbackChannelProvider, LoopbackStats, RecordingCommandSender,
};

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub peer: BdAddr,
    pub remote_io_capability: IoCapability,
    pub locally_initiated: bool,
    /// Peer is already bonded with this key
    pub bonded_key: Option<LinkKey>,
    pub fail_connection: bool,
    pub numeric_value: u32,
}

/// Outcome of one run, printed as JSON.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub peer: BdAddr,
    pub locally_initiated: bool,
    pub local_io_capability: IoCapability,
    pub remote_io_capability: Option<IoCapability>,
    /// Method both sides derive from the IO capability exchange
    pub decision: Option<AuthenticationDecision>,
    pub commands: Vec<HciCommand>,
    /// Key type in the peer's security record afterwards
    pub link_key_type: Option<KeyType>,
    pub final_state: SessionState,
    /// Address delivered to the completion sink
    pub completed: Option<BdAddr>,
    pub channels: LoopbackStats,
}

pub async fn run_simulation(
    options: &SimulationOptions,
    config: &PairingConfig,
) -> anyhow::Result<SimulationReport> {
    let peer = options.peer;
    let channels = if options.fail_connection {
        LoopbackChannelProvider::failing_connections(ErrorCode::CONNECTION_TIMEOUT)
    } else {
        LoopbackChannelProvider::new()
    };
    let commands = RecordingCommandSender::new();
    let records = Arc::new(InMemorySecurityRecordStore::new());
    records
        .insert(match &options.bonded_key {
            Some(key) => SecurityRecord::bonded(peer, key.clone(), KeyType::AuthenticatedP192),
            None => SecurityRecord::new(peer),
        })
        .await;

    let (completion_tx, completion_rx) = oneshot::channel();
    let (mut handler, handle) = ClassicPairingHandler::from_config(
        peer,
        config,
        PairingHandlerDeps {
            channels: Arc::new(channels.clone()),
            commands: Arc::new(commands.clone()),
            records: records.clone(),
        },
        completion_tx,
    );

    let local = LocalParameters::from_config(config, options.locally_initiated);
    info!(%peer, io_capability = %local.io_capability, "initiating pairing");
    handle.initiate(local)?;

    while handler.session().state() != SessionState::ChannelOpen
        && !handler.session().is_finished()
    {
        handler.step().await?;
    }

    let mut peer_script = ScriptedPeer {
        handler: &mut handler,
        handle: &handle,
    };
    let decision = if peer_script.handler.session().state() == SessionState::ChannelOpen {
        peer_script.play(options, &local).await?
    } else {
        None
    };

    if !handler.session().state().is_shutting_down() {
        handle.cancel()?;
    }
    let session = handler.run().await?;
    let completed = completion_rx.await.ok();

    Ok(SimulationReport {
        peer,
        locally_initiated: options.locally_initiated,
        local_io_capability: local.io_capability,
        remote_io_capability: session.remote_io_capability(),
        decision,
        commands: commands.sent().await,
        link_key_type: records.get(&peer).await.and_then(|record| record.key_type()),
        final_state: session.state(),
        completed,
        channels: channels.stats().await,
    })
}

/// The remote controller's side of the exchange.
struct ScriptedPeer<'a> {
    handler: &'a mut ClassicPairingHandler,
    handle: &'a PairingHandle,
}

impl ScriptedPeer<'_> {
    async fn send(&mut self, event: impl Into<HciEvent>) -> anyhow::Result<()> {
        self.handle.deliver(event)?;
        self.handler.step().await?;
        Ok(())
    }

    /// Returns the authentication decision, or `None` when the stored key was used.
    async fn play(
        &mut self,
        options: &SimulationOptions,
        local: &LocalParameters,
    ) -> anyhow::Result<Option<AuthenticationDecision>> {
        let peer = options.peer;

        self.send(LinkKeyRequest { bd_addr: peer }).await?;
        if options.bonded_key.is_some() {
            // authenticated with the stored key, no SSP
            return Ok(None);
        }

        self.send(IoCapabilityRequest { bd_addr: peer }).await?;
        self.send(IoCapabilityResponse {
            bd_addr: peer,
            io_capability: options.remote_io_capability.as_u8(),
            oob_data_present: OobDataPresent::NotPresent.as_u8(),
            authentication_requirements: AuthenticationRequirements::GeneralBondingMitmProtection
                .as_u8(),
        })
        .await?;
        self.send(UserConfirmationRequest {
            bd_addr: peer,
            numeric_value: options.numeric_value,
        })
        .await?;

        let decision = if local.locally_initiated {
            decide(local.io_capability, options.remote_io_capability)
        } else {
            decide(options.remote_io_capability, local.io_capability)
        };

        if decision.action == AuthenticationAction::AutoConfirmNow {
            let key_type = if decision.authenticated {
                KeyType::AuthenticatedP192
            } else {
                KeyType::UnauthenticatedP192
            };
            self.send(LinkKeyNotification {
                bd_addr: peer,
                link_key: simulated_link_key(peer, options.numeric_value),
                key_type: key_type.as_u8(),
            })
            .await?;
            self.send(SimplePairingComplete {
                status: ErrorCode::SUCCESS,
                bd_addr: peer,
            })
            .await?;
        } else {
            // nobody answers the UI request
            self.send(SimplePairingComplete {
                status: ErrorCode::AUTHENTICATION_FAILURE,
                bd_addr: peer,
            })
            .await?;
        }
        Ok(Some(decision))
    }
}

fn simulated_link_key(peer: BdAddr, numeric_value: u32) -> LinkKey {
    let mut bytes = [0u8; 16];
    bytes[..6].copy_from_slice(peer.bytes());
    bytes[6..10].copy_from_slice(&numeric_value.to_be_bytes());
    LinkKey::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEER: BdAddr = BdAddr::new([0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13]);

    fn options() -> SimulationOptions {
        SimulationOptions {
            peer: PEER,
            remote_io_capability: IoCapability::DisplayOnly,
            locally_initiated: true,
            bonded_key: None,
            fail_connection: false,
            numeric_value: 123_456,
        }
    }

    #[tokio::test]
    async fn responder_with_silent_initiator_pairs_automatically() {
        let options = SimulationOptions {
            remote_io_capability: IoCapability::NoInputNoOutput,
            locally_initiated: false,
            ..options()
        };
        let report = run_simulation(&options, &PairingConfig::default())
            .await
            .unwrap();

        assert_eq!(
            report.decision.map(|decision| decision.action),
            Some(AuthenticationAction::AutoConfirmNow)
        );
        assert_eq!(
            report.commands,
            vec![
                HciCommand::LinkKeyRequestNegativeReply { bd_addr: PEER },
                HciCommand::IoCapabilityRequestReply {
                    bd_addr: PEER,
                    io_capability: IoCapability::DisplayYesNo,
                    oob_present: OobDataPresent::NotPresent,
                    authentication_requirements:
                        AuthenticationRequirements::GeneralBondingMitmProtection,
                },
                HciCommand::UserConfirmationRequestReply { bd_addr: PEER },
            ]
        );
        assert_eq!(report.link_key_type, Some(KeyType::UnauthenticatedP192));
        assert_eq!(report.final_state, SessionState::Terminated);
        assert_eq!(report.completed, Some(PEER));
        assert_eq!(report.channels.acquired, report.channels.released);
    }

    #[tokio::test]
    async fn numeric_comparison_without_ui_is_not_confirmed() {
        let report = run_simulation(&options(), &PairingConfig::default())
            .await
            .unwrap();

        assert_eq!(
            report.decision.map(|decision| decision.action),
            Some(AuthenticationAction::RequestUiNumericComparison)
        );
        assert_eq!(report.commands.len(), 2);
        assert_eq!(report.link_key_type, None);
        assert_eq!(report.completed, Some(PEER));
    }

    #[tokio::test]
    async fn bonded_peer_gets_stored_key() {
        let key = LinkKey::new([0x33; 16]);
        let options = SimulationOptions {
            bonded_key: Some(key.clone()),
            ..options()
        };
        let report = run_simulation(&options, &PairingConfig::default())
            .await
            .unwrap();

        assert_eq!(report.decision, None);
        assert_eq!(
            report.commands,
            vec![HciCommand::LinkKeyRequestReply {
                bd_addr: PEER,
                link_key: key,
            }]
        );
        assert_eq!(report.link_key_type, Some(KeyType::AuthenticatedP192));
        assert_eq!(report.completed, Some(PEER));
    }

    #[tokio::test]
    async fn failed_connection_still_completes() {
        let options = SimulationOptions {
            fail_connection: true,
            ..options()
        };
        let report = run_simulation(&options, &PairingConfig::default())
            .await
            .unwrap();

        assert!(report.commands.is_empty());
        assert_eq!(report.remote_io_capability, None);
        assert_eq!(report.final_state, SessionState::Terminated);
        assert_eq!(report.completed, Some(PEER));
        assert_eq!(report.channels.acquired, 0);
        assert_eq!(report.channels.unregistered, 1);
    }

    #[test]
    fn report_serializes_without_key_material() {
        let report = SimulationReport {
            peer: PEER,
            locally_initiated: true,
            local_io_capability: IoCapability::DisplayYesNo,
            remote_io_capability: None,
            decision: None,
            commands: vec![HciCommand::LinkKeyRequestReply {
                bd_addr: PEER,
                link_key: LinkKey::new([0xEE; 16]),
            }],
            link_key_type: None,
            final_state: SessionState::Terminated,
            completed: Some(PEER),
            channels: LoopbackStats::default(),
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"peer\":\"00:1A:7D:DA:71:13\""));
        assert!(!json.contains("eeee"));
    }
}
