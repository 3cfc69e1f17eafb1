//! HCI event routing for a pairing session.
//!
//! 每个事件依次经过: 结构校验 → 地址校验 → 状态门 → 按类型处理。
//! A handler produces at most one outbound command, at most one record
//! mutation (link key notification only) and an optional cancel.

use tracing::{debug, info, warn};

use super::{ContractViolation, LocalParameters, PairingSession, SessionAction, SessionState};
use crate::auth::{decide, AuthenticationAction};
use crate::hci::{
    EventCode, HciCommand, HciEvent, IoCapabilityResponse, KeypressNotification,
    KeypressNotificationType, LinkKeyNotification, OobDataPresent, UserConfirmationRequest,
};
use crate::security::SecurityRecord;

impl PairingSession {
    /// Whether handling `event` needs the peer's security record looked up first.
    pub fn needs_security_record(event: &HciEvent) -> bool {
        matches!(event, HciEvent::LinkKeyRequest(_))
    }

    /// Route one HCI event.
    ///
    /// `record` is the peer's security record as currently stored; it is only
    /// consulted for link key requests.
    pub fn handle_hci(
        &mut self,
        event: &HciEvent,
        record: Option<&SecurityRecord>,
    ) -> Result<Vec<SessionAction>, ContractViolation> {
        let code = event.event_code();
        if !event.is_valid() {
            return Err(ContractViolation::MalformedEvent(code));
        }
        self.check_address(event)?;

        match self.state() {
            SessionState::Idle | SessionState::AwaitingRegistration => {
                return Err(ContractViolation::EventBeforeRegistration(code));
            }
            SessionState::Terminating | SessionState::Terminated => {
                debug!(address = %self.address(), event = %code, "session shutting down, event dropped");
                return Ok(vec![]);
            }
            SessionState::AwaitingConnection | SessionState::ChannelOpen => {}
        }

        match event {
            HciEvent::LinkKeyRequest(_) => Ok(self.on_link_key_request(record)),
            HciEvent::LinkKeyNotification(ev) => Ok(self.on_link_key_notification(ev)),
            HciEvent::IoCapabilityRequest(_) => self.on_io_capability_request(),
            HciEvent::IoCapabilityResponse(ev) => Ok(self.on_io_capability_response(ev)),
            HciEvent::UserConfirmationRequest(ev) => self.on_user_confirmation_request(ev),
            HciEvent::SimplePairingComplete(ev) => {
                // Status is not inspected: success and failure both end the session.
                info!(address = %self.address(), status = %ev.status, "simple pairing complete");
                Ok(self.cancel())
            }
            HciEvent::KeypressNotification(ev) => {
                self.on_keypress_notification(ev);
                Ok(vec![])
            }
            HciEvent::ChangeConnectionLinkKeyComplete(_)
            | HciEvent::MasterLinkKeyComplete(_)
            | HciEvent::PinCodeRequest(_)
            | HciEvent::UserPasskeyRequest(_)
            | HciEvent::RemoteOobDataRequest(_)
            | HciEvent::ReturnLinkKeys(_)
            | HciEvent::EncryptionChange(_)
            | HciEvent::EncryptionKeyRefreshComplete(_)
            | HciEvent::UserPasskeyNotification(_) => {
                info!(address = %self.address(), event = %code, "unsupported event, ignored");
                Ok(vec![])
            }
        }
    }

    fn check_address(&self, event: &HciEvent) -> Result<(), ContractViolation> {
        // Keypress notifications are the one address-carrying kind not checked.
        if matches!(event, HciEvent::KeypressNotification(_)) {
            return Ok(());
        }
        match event.peer_address() {
            Some(actual) if actual != self.address() => Err(ContractViolation::AddressMismatch {
                code: event.event_code(),
                expected: self.address(),
                actual,
            }),
            _ => Ok(()),
        }
    }

    fn on_link_key_request(&self, record: Option<&SecurityRecord>) -> Vec<SessionAction> {
        let bd_addr = self.address();
        let stored_key = record
            .filter(|record| record.is_bonded() || record.is_paired())
            .and_then(SecurityRecord::link_key);

        let command = match stored_key {
            Some(link_key) => HciCommand::LinkKeyRequestReply {
                bd_addr,
                link_key: link_key.clone(),
            },
            None => {
                match record {
                    Some(record) if record.is_bonded() || record.is_paired() => {
                        warn!(address = %bd_addr, "record is bonded but holds no link key");
                    }
                    _ => debug!(address = %bd_addr, "no link key for peer"),
                }
                HciCommand::LinkKeyRequestNegativeReply { bd_addr }
            }
        };
        vec![SessionAction::SendCommand(command)]
    }

    fn on_link_key_notification(&self, ev: &LinkKeyNotification) -> Vec<SessionAction> {
        // Decodability was checked by `is_valid`.
        match ev.key_type() {
            Some(key_type) => vec![SessionAction::StoreLinkKey {
                address: self.address(),
                link_key: ev.link_key.clone(),
                key_type,
            }],
            None => vec![],
        }
    }

    fn on_io_capability_request(&self) -> Result<Vec<SessionAction>, ContractViolation> {
        let local = LocalParameters::require(self.local.as_ref())?;
        // OOB data is never offered.
        Ok(vec![SessionAction::SendCommand(
            HciCommand::IoCapabilityRequestReply {
                bd_addr: self.address(),
                io_capability: local.io_capability,
                oob_present: OobDataPresent::NotPresent,
                authentication_requirements: local.authentication_requirements,
            },
        )])
    }

    fn on_io_capability_response(&mut self, ev: &IoCapabilityResponse) -> Vec<SessionAction> {
        self.remote_io_capability = ev.io_capability();
        debug!(
            address = %self.address(),
            remote_io_capability = ?self.remote_io_capability,
            "recorded remote io capability"
        );
        vec![]
    }

    fn on_user_confirmation_request(
        &self,
        ev: &UserConfirmationRequest,
    ) -> Result<Vec<SessionAction>, ContractViolation> {
        let local = LocalParameters::require(self.local.as_ref())?;
        let Some(remote) = self.remote_io_capability else {
            warn!(
                address = %self.address(),
                "user confirmation requested before the remote io capability is known, not replying"
            );
            return Ok(vec![]);
        };

        let (initiator, responder) = if local.locally_initiated {
            (local.io_capability, remote)
        } else {
            (remote, local.io_capability)
        };
        let decision = decide(initiator, responder);
        debug!(
            address = %self.address(),
            %initiator,
            %responder,
            action = ?decision.action,
            authenticated = decision.authenticated,
            "authentication decided"
        );

        let action = match decision.action {
            AuthenticationAction::AutoConfirmNow => {
                SessionAction::SendCommand(HciCommand::UserConfirmationRequestReply {
                    bd_addr: self.address(),
                })
            }
            AuthenticationAction::RequestUiNumericComparison
            | AuthenticationAction::RequestUiPasskeyEntry => {
                SessionAction::RequestUserInteraction {
                    address: self.address(),
                    action: decision.action,
                    authenticated: decision.authenticated,
                    numeric_value: ev.numeric_value,
                }
            }
        };
        Ok(vec![action])
    }

    fn on_keypress_notification(&self, ev: &KeypressNotification) {
        match ev.notification_type() {
            Some(KeypressNotificationType::EntryStarted) => {
                debug!(address = %self.address(), "passkey entry started")
            }
            Some(KeypressNotificationType::DigitEntered) => {
                debug!(address = %self.address(), "passkey digit entered")
            }
            Some(KeypressNotificationType::DigitErased) => {
                debug!(address = %self.address(), "passkey digit erased")
            }
            Some(KeypressNotificationType::Cleared) => {
                debug!(address = %self.address(), "passkey cleared")
            }
            Some(KeypressNotificationType::EntryCompleted) => {
                debug!(address = %self.address(), "passkey entry completed")
            }
            None => debug!(
                address = %self.address(),
                event = %EventCode::KeypressNotification,
                "unknown keypress notification type"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hci::{
        AuthenticationRequirements, EncryptionChange, ErrorCode, IoCapabilityRequest, IoCapability,
        KeyType, LinkKey, LinkKeyRequest, RemoteOobDataRequest, SimplePairingComplete,
    };
    use crate::ids::{BdAddr, ChannelId, RegistrationId};
    use crate::ports::{RegistrationResult, SecurityPolicy, ServiceId, ServiceRegistration};
    use crate::session::LifecycleEvent;

    const PEER: BdAddr = BdAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const OTHER: BdAddr = BdAddr::new([0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB]);
    const REGISTRATION: RegistrationId = RegistrationId::new(1);
    const CHANNEL: ChannelId = ChannelId::new(7);

    fn key() -> LinkKey {
        LinkKey::new([0x5A; 16])
    }

    fn session_with(io_capability: IoCapability, locally_initiated: bool) -> PairingSession {
        let mut session = PairingSession::new(
            PEER,
            ServiceRegistration {
                service_id: ServiceId::CLASSIC_PAIRING_TRIGGER,
                policy: SecurityPolicy::Best,
            },
        );
        session
            .handle_lifecycle(LifecycleEvent::Initiate(LocalParameters {
                locally_initiated,
                io_capability,
                oob_present: OobDataPresent::NotPresent,
                authentication_requirements: AuthenticationRequirements::default(),
            }))
            .unwrap();
        session
            .handle_lifecycle(LifecycleEvent::RegistrationComplete {
                result: RegistrationResult::Success(REGISTRATION),
            })
            .unwrap();
        session
            .handle_lifecycle(LifecycleEvent::ConnectionOpened { channel: CHANNEL })
            .unwrap();
        session
    }

    fn open_session() -> PairingSession {
        session_with(IoCapability::DisplayOnly, true)
    }

    fn io_response(bd_addr: BdAddr, io_capability: IoCapability) -> HciEvent {
        HciEvent::from(IoCapabilityResponse {
            bd_addr,
            io_capability: io_capability.as_u8(),
            oob_data_present: 0x00,
            authentication_requirements: 0x05,
        })
    }

    fn confirmation(numeric_value: u32) -> HciEvent {
        HciEvent::from(UserConfirmationRequest {
            bd_addr: PEER,
            numeric_value,
        })
    }

    #[test]
    fn link_key_request_for_bonded_peer_replies_with_stored_key() {
        let mut session = open_session();
        let record = SecurityRecord::bonded(PEER, key(), KeyType::AuthenticatedP192);
        let event = HciEvent::from(LinkKeyRequest { bd_addr: PEER });

        assert!(PairingSession::needs_security_record(&event));
        let actions = session.handle_hci(&event, Some(&record)).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::SendCommand(HciCommand::LinkKeyRequestReply {
                bd_addr: PEER,
                link_key: key(),
            })]
        );
    }

    #[test]
    fn link_key_request_for_paired_peer_replies_with_stored_key() {
        let mut session = open_session();
        let mut record = SecurityRecord::new(PEER);
        record.set_paired(true);
        record.set_link_key(LinkKey::new([9; 16]), KeyType::UnauthenticatedP192);
        assert!(!record.is_bonded());

        let actions = session
            .handle_hci(&HciEvent::from(LinkKeyRequest { bd_addr: PEER }), Some(&record))
            .unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::SendCommand(HciCommand::LinkKeyRequestReply {
                bd_addr: PEER,
                link_key: LinkKey::new([9; 16]),
            })]
        );
    }

    #[test]
    fn link_key_request_without_bond_is_refused() {
        let mut session = open_session();
        let event = HciEvent::from(LinkKeyRequest { bd_addr: PEER });
        let expected = vec![SessionAction::SendCommand(
            HciCommand::LinkKeyRequestNegativeReply { bd_addr: PEER },
        )];

        let unbonded = SecurityRecord::new(PEER);
        assert_eq!(session.handle_hci(&event, Some(&unbonded)).unwrap(), expected);
        assert_eq!(session.handle_hci(&event, None).unwrap(), expected);

        let mut keyless = SecurityRecord::new(PEER);
        keyless.set_bonded(true);
        assert_eq!(session.handle_hci(&event, Some(&keyless)).unwrap(), expected);
    }

    #[test]
    fn link_key_notification_stores_key() {
        let mut session = open_session();
        let event = HciEvent::from(LinkKeyNotification {
            bd_addr: PEER,
            link_key: key(),
            key_type: KeyType::UnauthenticatedP192.as_u8(),
        });

        assert!(!PairingSession::needs_security_record(&event));
        let actions = session.handle_hci(&event, None).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::StoreLinkKey {
                address: PEER,
                link_key: key(),
                key_type: KeyType::UnauthenticatedP192,
            }]
        );
    }

    #[test]
    fn io_capability_request_replies_with_local_parameters() {
        let mut session = open_session();
        let actions = session
            .handle_hci(&HciEvent::from(IoCapabilityRequest { bd_addr: PEER }), None)
            .unwrap();

        assert_eq!(
            actions,
            vec![SessionAction::SendCommand(
                HciCommand::IoCapabilityRequestReply {
                    bd_addr: PEER,
                    io_capability: IoCapability::DisplayOnly,
                    oob_present: OobDataPresent::NotPresent,
                    authentication_requirements:
                        AuthenticationRequirements::GeneralBondingMitmProtection,
                }
            )]
        );
    }

    #[test]
    fn io_capability_response_records_remote_without_output() {
        let mut session = open_session();
        let actions = session
            .handle_hci(&io_response(PEER, IoCapability::KeyboardOnly), None)
            .unwrap();

        assert!(actions.is_empty());
        assert_eq!(
            session.remote_io_capability(),
            Some(IoCapability::KeyboardOnly)
        );
    }

    #[test]
    fn display_only_pair_confirms_automatically() {
        let mut session = open_session();
        session
            .handle_hci(&io_response(PEER, IoCapability::DisplayOnly), None)
            .unwrap();

        let actions = session.handle_hci(&confirmation(123_456), None).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::SendCommand(
                HciCommand::UserConfirmationRequestReply { bd_addr: PEER }
            )]
        );
    }

    #[test]
    fn responder_role_swaps_table_axes() {
        // KeyboardOnly initiator, NoInputNoOutput responder
        let mut initiator = session_with(IoCapability::KeyboardOnly, true);
        initiator
            .handle_hci(&io_response(PEER, IoCapability::NoInputNoOutput), None)
            .unwrap();
        assert_eq!(
            initiator.handle_hci(&confirmation(1), None).unwrap(),
            vec![SessionAction::SendCommand(
                HciCommand::UserConfirmationRequestReply { bd_addr: PEER }
            )]
        );

        // DisplayYesNo initiator, KeyboardOnly responder
        let mut responder = session_with(IoCapability::KeyboardOnly, false);
        responder
            .handle_hci(&io_response(PEER, IoCapability::DisplayYesNo), None)
            .unwrap();
        assert_eq!(
            responder.handle_hci(&confirmation(42), None).unwrap(),
            vec![SessionAction::RequestUserInteraction {
                address: PEER,
                action: AuthenticationAction::RequestUiPasskeyEntry,
                authenticated: true,
                numeric_value: 42,
            }]
        );
    }

    #[test]
    fn numeric_comparison_is_handed_to_the_user() {
        let mut session = session_with(IoCapability::DisplayYesNo, true);
        session
            .handle_hci(&io_response(PEER, IoCapability::DisplayYesNo), None)
            .unwrap();

        let actions = session.handle_hci(&confirmation(654_321), None).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::RequestUserInteraction {
                address: PEER,
                action: AuthenticationAction::RequestUiNumericComparison,
                authenticated: true,
                numeric_value: 654_321,
            }]
        );
    }

    #[test]
    fn confirmation_with_unknown_remote_is_not_answered() {
        let mut session = open_session();
        let actions = session.handle_hci(&confirmation(1), None).unwrap();
        assert!(actions.is_empty());
        assert_eq!(session.state(), SessionState::ChannelOpen);
    }

    #[test]
    fn event_for_other_peer_is_a_contract_violation() {
        let mut session = open_session();
        let err = session
            .handle_hci(&io_response(OTHER, IoCapability::DisplayOnly), None)
            .unwrap_err();
        assert_eq!(
            err,
            ContractViolation::AddressMismatch {
                code: EventCode::IoCapabilityResponse,
                expected: PEER,
                actual: OTHER,
            }
        );

        let err = session
            .handle_hci(
                &HciEvent::from(RemoteOobDataRequest { bd_addr: OTHER }),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ContractViolation::AddressMismatch { .. }));
    }

    #[test]
    fn malformed_event_is_a_contract_violation() {
        let mut session = open_session();
        let event = HciEvent::from(IoCapabilityResponse {
            bd_addr: PEER,
            io_capability: 0x04,
            oob_data_present: 0x00,
            authentication_requirements: 0x05,
        });
        assert_eq!(
            session.handle_hci(&event, None).unwrap_err(),
            ContractViolation::MalformedEvent(EventCode::IoCapabilityResponse)
        );
    }

    #[test]
    fn keypress_notification_is_a_no_op_for_any_address() {
        let mut session = open_session();
        for notification_type in 0..=4u8 {
            let event = HciEvent::from(KeypressNotification {
                bd_addr: OTHER,
                notification_type,
            });
            assert!(session.handle_hci(&event, None).unwrap().is_empty());
        }
        assert_eq!(session.state(), SessionState::ChannelOpen);
    }

    #[test]
    fn connection_scoped_events_are_ignored() {
        let mut session = open_session();
        let event = HciEvent::from(EncryptionChange {
            status: ErrorCode::SUCCESS,
            connection_handle: 0x0040,
            encryption_enabled: 0x01,
        });
        assert!(session.handle_hci(&event, None).unwrap().is_empty());
    }

    #[test]
    fn simple_pairing_complete_cancels_regardless_of_status() {
        for status in [ErrorCode::SUCCESS, ErrorCode::AUTHENTICATION_FAILURE] {
            let mut session = open_session();
            let actions = session
                .handle_hci(
                    &HciEvent::from(SimplePairingComplete {
                        status,
                        bd_addr: PEER,
                    }),
                    None,
                )
                .unwrap();

            assert_eq!(
                actions,
                vec![
                    SessionAction::ReleaseChannel { channel: CHANNEL },
                    SessionAction::Unregister {
                        registration: REGISTRATION
                    },
                ]
            );
            assert_eq!(session.state(), SessionState::Terminating);
        }
    }

    #[test]
    fn events_after_cancel_have_no_effect() {
        let mut session = open_session();
        session.handle_lifecycle(LifecycleEvent::Cancel).unwrap();

        let actions = session
            .handle_hci(&HciEvent::from(IoCapabilityRequest { bd_addr: PEER }), None)
            .unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn event_before_registration_is_a_contract_violation() {
        let mut session = PairingSession::new(
            PEER,
            ServiceRegistration {
                service_id: ServiceId::CLASSIC_PAIRING_TRIGGER,
                policy: SecurityPolicy::Best,
            },
        );
        let err = session
            .handle_hci(&HciEvent::from(IoCapabilityRequest { bd_addr: PEER }), None)
            .unwrap_err();
        assert_eq!(
            err,
            ContractViolation::EventBeforeRegistration(EventCode::IoCapabilityRequest)
        );
    }
}
