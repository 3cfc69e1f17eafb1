//! Pairing session lifecycle
//!
//! 配对会话的生命周期状态机: 注册配对触发服务 → 连接 → 持有信道 → 注销 → 结束。
//!
//! The session is a pure state machine: `(state, input) -> (new state, actions)`.
//! It never calls a collaborator itself; the handler in `cp-app` executes the
//! returned [`SessionAction`]s and feeds collaborator continuations back in.

use tracing::debug;

use super::{ContractViolation, Held, LifecycleEvent, LocalParameters, SessionAction, SessionState};
use crate::hci::IoCapability;
use crate::ids::{BdAddr, ChannelId, RegistrationId};
use crate::ports::{RegistrationResult, ServiceRegistration};

/// State of one pairing attempt with one remote device.
#[derive(Debug, Clone)]
pub struct PairingSession {
    /// 对端地址 (构造后不可变)
    address: BdAddr,
    registration_request: ServiceRegistration,
    state: SessionState,
    /// Set by `Initiate`
    pub(super) local: Option<LocalParameters>,
    /// Learned from the peer's IO capability response; `None` means unknown
    pub(super) remote_io_capability: Option<IoCapability>,
    channel: Held<ChannelId>,
    registration: Held<RegistrationId>,
    /// `RegisterService` was emitted and its result has not arrived yet
    registration_outstanding: bool,
    completed: bool,
}

impl PairingSession {
    pub fn new(address: BdAddr, registration_request: ServiceRegistration) -> Self {
        Self {
            address,
            registration_request,
            state: SessionState::Idle,
            local: None,
            remote_io_capability: None,
            channel: Held::Vacant,
            registration: Held::Vacant,
            registration_outstanding: false,
            completed: false,
        }
    }

    pub fn address(&self) -> BdAddr {
        self.address
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_parameters(&self) -> Option<&LocalParameters> {
        self.local.as_ref()
    }

    pub fn remote_io_capability(&self) -> Option<IoCapability> {
        self.remote_io_capability
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel.get()
    }

    pub fn registration(&self) -> Option<RegistrationId> {
        self.registration.get()
    }

    /// Whether the completion action has been produced.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Terminated, with no registration result still in flight.
    ///
    /// A session cancelled before its registration completed is terminated
    /// but must still see that result to give the registration back.
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal() && !self.registration_outstanding
    }

    /// Apply a lifecycle input.
    pub fn handle_lifecycle(
        &mut self,
        event: LifecycleEvent,
    ) -> Result<Vec<SessionAction>, ContractViolation> {
        if matches!(event, LifecycleEvent::RegistrationComplete { .. })
            && matches!(
                self.state,
                SessionState::AwaitingRegistration | SessionState::Terminated
            )
        {
            self.registration_outstanding = false;
        }

        match (self.state, event) {
            (SessionState::Idle, LifecycleEvent::Initiate(params)) => {
                self.local = Some(params);
                self.state = SessionState::AwaitingRegistration;
                self.registration_outstanding = true;
                Ok(vec![SessionAction::RegisterService(
                    self.registration_request,
                )])
            }
            (state, LifecycleEvent::Initiate(_)) => Err(ContractViolation::AlreadyInitiated(state)),

            (
                SessionState::AwaitingRegistration,
                LifecycleEvent::RegistrationComplete {
                    result: RegistrationResult::Success(registration),
                },
            ) => {
                self.registration.acquire(registration).map_err(|held| {
                    ContractViolation::RegistrationAlreadyHeld {
                        held,
                        completed: registration,
                    }
                })?;
                self.state = SessionState::AwaitingConnection;
                Ok(vec![SessionAction::ConnectServices {
                    address: self.address,
                }])
            }
            (SessionState::AwaitingRegistration, LifecycleEvent::RegistrationComplete { result }) => {
                debug!(address = %self.address, ?result, "pairing service registration failed");
                Ok(self.cancel())
            }
            // Cancelled before the provider answered: give the late
            // registration back without completing a second time.
            (
                SessionState::Terminated,
                LifecycleEvent::RegistrationComplete {
                    result: RegistrationResult::Success(registration),
                },
            ) => Ok(vec![SessionAction::Unregister { registration }]),
            (SessionState::Terminated, LifecycleEvent::RegistrationComplete { .. }) => Ok(vec![]),

            (SessionState::AwaitingConnection, LifecycleEvent::ConnectionOpened { channel }) => {
                self.channel
                    .acquire(channel)
                    .map_err(|held| ContractViolation::ChannelAlreadyHeld {
                        held,
                        opened: channel,
                    })?;
                self.state = SessionState::ChannelOpen;
                Ok(vec![
                    SessionAction::AcquireChannel { channel },
                    SessionAction::SubscribeChannelClose { channel },
                ])
            }
            (SessionState::ChannelOpen, LifecycleEvent::ConnectionOpened { channel }) => {
                Err(ContractViolation::ChannelAlreadyHeld {
                    held: self.channel.get().unwrap_or(channel),
                    opened: channel,
                })
            }
            // Never acquired, so there is nothing to release.
            (state, LifecycleEvent::ConnectionOpened { channel }) if state.is_shutting_down() => {
                debug!(address = %self.address, %channel, "ignoring channel opened after cancel");
                Ok(vec![])
            }

            (_, LifecycleEvent::ConnectionFailed { reason }) => {
                debug!(address = %self.address, %reason, "connection failed");
                Ok(self.cancel())
            }

            (SessionState::ChannelOpen, LifecycleEvent::ChannelClosed { channel, .. }) => {
                if self.channel.get() != Some(channel) {
                    return Err(ContractViolation::ChannelMismatch {
                        closed: channel,
                        held: self.channel.get(),
                    });
                }
                Ok(self.cancel())
            }
            // Already released by an earlier cancel.
            (state, LifecycleEvent::ChannelClosed { .. }) if state.is_shutting_down() => Ok(vec![]),

            (_, LifecycleEvent::Cancel) => Ok(self.cancel()),

            (SessionState::Terminating, LifecycleEvent::Unregistered) => {
                self.registration.release();
                self.state = SessionState::Terminated;
                Ok(self.complete())
            }
            (SessionState::Terminated, LifecycleEvent::Unregistered) => Ok(vec![]),

            (state, event) => Err(ContractViolation::UnexpectedSignal {
                signal: event.name(),
                state,
            }),
        }
    }

    /// Tear the session down. Idempotent.
    ///
    /// Releases the channel if one is held, then either asks for the
    /// registration to be removed (completion follows `Unregistered`) or, with
    /// nothing registered, completes right away.
    pub(super) fn cancel(&mut self) -> Vec<SessionAction> {
        if self.state.is_shutting_down() {
            return vec![];
        }

        let mut actions = Vec::new();
        if let Some(channel) = self.channel.release() {
            actions.push(SessionAction::ReleaseChannel { channel });
        }

        match self.registration.get() {
            Some(registration) => {
                self.state = SessionState::Terminating;
                actions.push(SessionAction::Unregister { registration });
            }
            None => {
                self.state = SessionState::Terminated;
                actions.extend(self.complete());
            }
        }
        actions
    }

    fn complete(&mut self) -> Vec<SessionAction> {
        if self.completed {
            return vec![];
        }
        self.completed = true;
        vec![SessionAction::Complete {
            address: self.address,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hci::{AuthenticationRequirements, ErrorCode, OobDataPresent};
    use crate::ports::{ConnectionFailure, SecurityPolicy, ServiceId};

    const PEER: BdAddr = BdAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const REGISTRATION: RegistrationId = RegistrationId::new(1);
    const CHANNEL: ChannelId = ChannelId::new(10);

    fn service() -> ServiceRegistration {
        ServiceRegistration {
            service_id: ServiceId::CLASSIC_PAIRING_TRIGGER,
            policy: SecurityPolicy::Best,
        }
    }

    fn params() -> LocalParameters {
        LocalParameters {
            locally_initiated: true,
            io_capability: IoCapability::DisplayOnly,
            oob_present: OobDataPresent::NotPresent,
            authentication_requirements: AuthenticationRequirements::default(),
        }
    }

    fn registered_session() -> PairingSession {
        let mut session = PairingSession::new(PEER, service());
        session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap();
        session
            .handle_lifecycle(LifecycleEvent::RegistrationComplete {
                result: RegistrationResult::Success(REGISTRATION),
            })
            .unwrap();
        session
    }

    fn open_session() -> PairingSession {
        let mut session = registered_session();
        session
            .handle_lifecycle(LifecycleEvent::ConnectionOpened { channel: CHANNEL })
            .unwrap();
        session
    }

    fn assert_channel_invariant(session: &PairingSession) {
        assert_eq!(
            session.channel().is_some(),
            session.state() == SessionState::ChannelOpen,
            "channel held in state {}",
            session.state()
        );
    }

    #[test]
    fn initiate_requests_registration() {
        let mut session = PairingSession::new(PEER, service());
        let actions = session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap();

        assert_eq!(session.state(), SessionState::AwaitingRegistration);
        assert_eq!(actions, vec![SessionAction::RegisterService(service())]);
        assert_eq!(session.local_parameters(), Some(&params()));
        assert_eq!(session.remote_io_capability(), None);
    }

    #[test]
    fn initiate_twice_is_a_contract_violation() {
        let mut session = PairingSession::new(PEER, service());
        session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap();
        let err = session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap_err();
        assert_eq!(
            err,
            ContractViolation::AlreadyInitiated(SessionState::AwaitingRegistration)
        );
    }

    #[test]
    fn registration_then_connect_for_bound_address() {
        let mut session = PairingSession::new(PEER, service());
        session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap();
        let actions = session
            .handle_lifecycle(LifecycleEvent::RegistrationComplete {
                result: RegistrationResult::Success(REGISTRATION),
            })
            .unwrap();

        assert_eq!(session.state(), SessionState::AwaitingConnection);
        assert_eq!(session.registration(), Some(REGISTRATION));
        assert_eq!(actions, vec![SessionAction::ConnectServices { address: PEER }]);
        assert_channel_invariant(&session);
    }

    #[test]
    fn connection_open_acquires_channel_once() {
        let mut session = registered_session();
        let actions = session
            .handle_lifecycle(LifecycleEvent::ConnectionOpened { channel: CHANNEL })
            .unwrap();

        assert_eq!(session.state(), SessionState::ChannelOpen);
        assert_eq!(session.channel(), Some(CHANNEL));
        assert_eq!(
            actions,
            vec![
                SessionAction::AcquireChannel { channel: CHANNEL },
                SessionAction::SubscribeChannelClose { channel: CHANNEL },
            ]
        );
        assert_channel_invariant(&session);
    }

    #[test]
    fn second_open_is_a_contract_violation() {
        let mut session = open_session();
        let err = session
            .handle_lifecycle(LifecycleEvent::ConnectionOpened {
                channel: ChannelId::new(11),
            })
            .unwrap_err();
        assert_eq!(
            err,
            ContractViolation::ChannelAlreadyHeld {
                held: CHANNEL,
                opened: ChannelId::new(11),
            }
        );
    }

    #[test]
    fn connection_failure_unregisters_then_completes_once() {
        let mut session = registered_session();
        let actions = session
            .handle_lifecycle(LifecycleEvent::ConnectionFailed {
                reason: ConnectionFailure::HciError(ErrorCode::CONNECTION_TIMEOUT),
            })
            .unwrap();

        assert_eq!(session.state(), SessionState::Terminating);
        assert_eq!(
            actions,
            vec![SessionAction::Unregister {
                registration: REGISTRATION
            }]
        );
        assert!(!session.is_completed());

        let actions = session
            .handle_lifecycle(LifecycleEvent::Unregistered)
            .unwrap();
        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(actions, vec![SessionAction::Complete { address: PEER }]);
        assert_eq!(session.registration(), None);
        assert!(session.is_completed());
    }

    #[test]
    fn cancel_while_open_releases_then_unregisters() {
        let mut session = open_session();
        let actions = session.handle_lifecycle(LifecycleEvent::Cancel).unwrap();

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
        assert_channel_invariant(&session);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut session = open_session();
        session.handle_lifecycle(LifecycleEvent::Cancel).unwrap();

        assert!(session
            .handle_lifecycle(LifecycleEvent::Cancel)
            .unwrap()
            .is_empty());

        session
            .handle_lifecycle(LifecycleEvent::Unregistered)
            .unwrap();
        assert!(session
            .handle_lifecycle(LifecycleEvent::Cancel)
            .unwrap()
            .is_empty());
        assert!(session
            .handle_lifecycle(LifecycleEvent::Unregistered)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn cancel_from_idle_completes_immediately() {
        let mut session = PairingSession::new(PEER, service());
        let actions = session.handle_lifecycle(LifecycleEvent::Cancel).unwrap();

        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(actions, vec![SessionAction::Complete { address: PEER }]);
        assert!(session.is_finished());
    }

    #[test]
    fn registration_failure_completes_without_unregister() {
        let mut session = PairingSession::new(PEER, service());
        session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap();
        let actions = session
            .handle_lifecycle(LifecycleEvent::RegistrationComplete {
                result: RegistrationResult::DuplicateService,
            })
            .unwrap();

        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(actions, vec![SessionAction::Complete { address: PEER }]);
    }

    #[test]
    fn late_registration_after_cancel_is_returned() {
        let mut session = PairingSession::new(PEER, service());
        session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap();
        let actions = session.handle_lifecycle(LifecycleEvent::Cancel).unwrap();
        assert_eq!(actions, vec![SessionAction::Complete { address: PEER }]);
        assert!(session.state().is_terminal());
        assert!(!session.is_finished());

        let actions = session
            .handle_lifecycle(LifecycleEvent::RegistrationComplete {
                result: RegistrationResult::Success(REGISTRATION),
            })
            .unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::Unregister {
                registration: REGISTRATION
            }]
        );
        assert!(session
            .handle_lifecycle(LifecycleEvent::Unregistered)
            .unwrap()
            .is_empty());
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(session.is_finished());
    }

    #[test]
    fn channel_closed_by_peer_cancels() {
        let mut session = open_session();
        let actions = session
            .handle_lifecycle(LifecycleEvent::ChannelClosed {
                channel: CHANNEL,
                reason: ErrorCode::REMOTE_USER_TERMINATED_CONNECTION,
            })
            .unwrap();

        assert_eq!(actions[0], SessionAction::ReleaseChannel { channel: CHANNEL });
        assert_eq!(session.state(), SessionState::Terminating);

        // the close that follows our own release is absorbed
        let actions = session
            .handle_lifecycle(LifecycleEvent::ChannelClosed {
                channel: CHANNEL,
                reason: ErrorCode::CONNECTION_TERMINATED_BY_LOCAL_HOST,
            })
            .unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn close_of_unknown_channel_is_a_contract_violation() {
        let mut session = open_session();
        let err = session
            .handle_lifecycle(LifecycleEvent::ChannelClosed {
                channel: ChannelId::new(99),
                reason: ErrorCode::SUCCESS,
            })
            .unwrap_err();
        assert!(matches!(err, ContractViolation::ChannelMismatch { .. }));
    }

    #[test]
    fn unregistered_before_cancel_is_unexpected() {
        let mut session = registered_session();
        let err = session
            .handle_lifecycle(LifecycleEvent::Unregistered)
            .unwrap_err();
        assert_eq!(
            err,
            ContractViolation::UnexpectedSignal {
                signal: "Unregistered",
                state: SessionState::AwaitingConnection,
            }
        );
    }

    #[test]
    fn open_before_registration_is_unexpected() {
        let mut session = PairingSession::new(PEER, service());
        session
            .handle_lifecycle(LifecycleEvent::Initiate(params()))
            .unwrap();
        let err = session
            .handle_lifecycle(LifecycleEvent::ConnectionOpened { channel: CHANNEL })
            .unwrap_err();
        assert!(matches!(err, ContractViolation::UnexpectedSignal { .. }));
    }

    #[test]
    fn completion_is_produced_exactly_once_across_paths() {
        let mut session = open_session();
        let mut completions = 0;
        let inputs = vec![
            LifecycleEvent::Cancel,
            LifecycleEvent::ChannelClosed {
                channel: CHANNEL,
                reason: ErrorCode::SUCCESS,
            },
            LifecycleEvent::Cancel,
            LifecycleEvent::Unregistered,
            LifecycleEvent::Cancel,
            LifecycleEvent::Unregistered,
        ];
        for input in inputs {
            let actions = session.handle_lifecycle(input).unwrap();
            completions += actions
                .iter()
                .filter(|action| matches!(action, SessionAction::Complete { .. }))
                .count();
            assert_channel_invariant(&session);
        }
        assert_eq!(completions, 1);
    }
}
