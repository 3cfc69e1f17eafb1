//! Serialized execution context of one pairing session.
//!
//! The handler owns the [`PairingSession`] outright: inputs are taken from the
//! mailbox one at a time, the session returns the side effects of each
//! transition, and the handler performs them before looking at the next input.
//! Collaborator results come back through the same mailbox, never by callback.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, error, info, info_span, warn, Instrument};

use cp_core::ports::{
    ChannelProviderPort, CommandSenderPort, ConnectionFailure, MailboxReceiver,
    RegistrationResult, SecurityRecordStorePort, ServiceRegistration, WeakMailbox,
};
use cp_core::{
    BdAddr, HciEvent, LifecycleEvent, Mailbox, PairingConfig, PairingSession, SecurityRecord,
    SessionAction, SessionInput,
};

use super::{HandlerError, PairingHandle};

/// Ports the handler executes session actions against.
#[derive(Clone)]
pub struct PairingHandlerDeps {
    pub channels: Arc<dyn ChannelProviderPort>,
    pub commands: Arc<dyn CommandSenderPort>,
    pub records: Arc<dyn SecurityRecordStorePort>,
}

pub struct ClassicPairingHandler {
    session: PairingSession,
    deps: PairingHandlerDeps,
    mailbox: WeakMailbox,
    inbox: MailboxReceiver,
    completion: Option<oneshot::Sender<BdAddr>>,
}

impl ClassicPairingHandler {
    /// Create a handler bound to `address`, plus the handle used to drive it.
    ///
    /// `completion` receives the address once the session has fully
    /// terminated. It is dropped unfired if the handler stops on a contract
    /// violation.
    pub fn new(
        address: BdAddr,
        registration: ServiceRegistration,
        deps: PairingHandlerDeps,
        completion: oneshot::Sender<BdAddr>,
    ) -> (Self, PairingHandle) {
        let (mailbox, inbox) = Mailbox::channel();
        let handler = Self {
            session: PairingSession::new(address, registration),
            deps,
            mailbox: mailbox.downgrade(),
            inbox,
            completion: Some(completion),
        };
        (handler, PairingHandle::new(address, mailbox))
    }

    /// Like [`ClassicPairingHandler::new`], registering the service described
    /// in the `[service]` section of `config`.
    pub fn from_config(
        address: BdAddr,
        config: &PairingConfig,
        deps: PairingHandlerDeps,
        completion: oneshot::Sender<BdAddr>,
    ) -> (Self, PairingHandle) {
        let registration = ServiceRegistration {
            service_id: config.service.service_id,
            policy: config.service.security_policy,
        };
        Self::new(address, registration, deps, completion)
    }

    pub fn session(&self) -> &PairingSession {
        &self.session
    }

    /// Process inputs until the session is finished.
    ///
    /// Returns the final session on success. A contract violation stops the
    /// loop immediately and is returned as the error.
    pub async fn run(mut self) -> Result<PairingSession, HandlerError> {
        while !self.session.is_finished() {
            self.step().await?;
        }
        debug!(address = %self.session.address(), "pairing session finished");
        Ok(self.session)
    }

    /// Wait for the next input and process it.
    pub async fn step(&mut self) -> Result<(), HandlerError> {
        let input = self.inbox.recv().await.ok_or_else(|| {
            warn!(
                address = %self.session.address(),
                state = %self.session.state(),
                "mailbox closed before the session finished"
            );
            HandlerError::MailboxClosed
        })?;
        self.dispatch(input).await
    }

    /// Apply one input and execute the resulting actions.
    pub async fn dispatch(&mut self, input: SessionInput) -> Result<(), HandlerError> {
        let span = info_span!(
            "pairing.dispatch",
            address = %self.session.address(),
            input = input.name()
        );
        async {
            info!("Received: {}", input.name());
            let old_state = self.session.state();

            let result = match input {
                SessionInput::Lifecycle(event) => self.session.handle_lifecycle(event),
                SessionInput::Hci(event) => {
                    let record = self.record_for(&event).await;
                    self.session.handle_hci(&event, record.as_ref())
                }
            };
            let actions = result.map_err(|violation| {
                error!(%violation, state = %old_state, "contract violation, stopping pairing session");
                HandlerError::Contract(violation)
            })?;

            let new_state = self.session.state();
            if new_state != old_state {
                info!(%old_state, %new_state, "pairing state transition");
            }

            self.execute_actions(actions).await
        }
        .instrument(span)
        .await
    }

    async fn record_for(&self, event: &HciEvent) -> Option<SecurityRecord> {
        if !PairingSession::needs_security_record(event) {
            return None;
        }
        let address = self.session.address();
        match self.deps.records.lookup(&address).await {
            Ok(record) => record,
            Err(err) => {
                warn!(%address, error = %err, "security record lookup failed");
                None
            }
        }
    }

    fn mailbox(&self) -> Result<Mailbox, HandlerError> {
        self.mailbox.upgrade().ok_or(HandlerError::MailboxClosed)
    }

    /// Post a continuation the collaborator could not deliver itself.
    fn post_self(&self, event: LifecycleEvent) -> Result<(), HandlerError> {
        self.mailbox()?
            .post_lifecycle(event)
            .map_err(|_| HandlerError::MailboxClosed)
    }

    async fn execute_actions(&mut self, actions: Vec<SessionAction>) -> Result<(), HandlerError> {
        for action in actions {
            match action {
                SessionAction::RegisterService(registration) => {
                    let mailbox = self.mailbox()?;
                    if let Err(err) = self
                        .deps
                        .channels
                        .register_service(registration, mailbox)
                        .await
                    {
                        warn!(error = %err, service = %registration.service_id, "register_service failed");
                        self.post_self(LifecycleEvent::RegistrationComplete {
                            result: RegistrationResult::InvalidService,
                        })?;
                    }
                }
                SessionAction::ConnectServices { address } => {
                    let mailbox = self.mailbox()?;
                    if let Err(err) = self.deps.channels.connect_services(address, mailbox).await {
                        warn!(error = %err, "connect_services failed");
                        self.post_self(LifecycleEvent::ConnectionFailed {
                            reason: ConnectionFailure::Provider(err.to_string()),
                        })?;
                    }
                }
                SessionAction::AcquireChannel { channel } => {
                    if let Err(err) = self.deps.channels.acquire(channel).await {
                        warn!(error = %err, %channel, "channel acquire failed");
                    }
                }
                SessionAction::SubscribeChannelClose { channel } => {
                    let mailbox = self.mailbox()?;
                    if let Err(err) = self.deps.channels.subscribe_close(channel, mailbox).await {
                        warn!(error = %err, %channel, "close subscription failed");
                    }
                }
                SessionAction::ReleaseChannel { channel } => {
                    if let Err(err) = self.deps.channels.release(channel).await {
                        warn!(error = %err, %channel, "channel release failed");
                    }
                }
                SessionAction::Unregister { registration } => {
                    let mailbox = self.mailbox()?;
                    if let Err(err) = self.deps.channels.unregister(registration, mailbox).await {
                        // Nothing else will report back; finish the teardown ourselves.
                        warn!(error = %err, %registration, "unregister failed");
                        self.post_self(LifecycleEvent::Unregistered)?;
                    }
                }
                SessionAction::SendCommand(command) => {
                    let op_code = command.op_code();
                    debug!(%op_code, "sending command");
                    if let Err(err) = self.deps.commands.send(command).await {
                        warn!(error = %err, %op_code, "command send failed");
                    }
                }
                SessionAction::StoreLinkKey {
                    address,
                    link_key,
                    key_type,
                } => {
                    if let Err(err) = self
                        .deps
                        .records
                        .set_link_key(&address, link_key, key_type)
                        .await
                    {
                        warn!(error = %err, %address, "storing link key failed");
                    }
                }
                SessionAction::RequestUserInteraction {
                    address,
                    action,
                    authenticated,
                    numeric_value,
                } => {
                    info!(
                        %address,
                        ?action,
                        authenticated,
                        numeric_value,
                        "user interaction required, no consumer attached"
                    );
                }
                SessionAction::Complete { address } => match self.completion.take() {
                    Some(completion) => {
                        if completion.send(address).is_err() {
                            debug!(%address, "completion receiver dropped");
                        }
                    }
                    None => warn!(%address, "completion already delivered"),
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_core::ports::{SecurityPolicy, ServiceId};
    use cp_core::{ContractViolation, LocalParameters, SessionState};
    use cp_infra::{InMemorySecurityRecordStore, LoopbackChannelProvider, RecordingCommandSender};

    const PEER: BdAddr = BdAddr::new([0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22]);

    fn deps() -> PairingHandlerDeps {
        PairingHandlerDeps {
            channels: Arc::new(LoopbackChannelProvider::new()),
            commands: Arc::new(RecordingCommandSender::new()),
            records: Arc::new(InMemorySecurityRecordStore::new()),
        }
    }

    #[tokio::test]
    async fn from_config_registers_configured_service() {
        let mut config = PairingConfig::default();
        config.service.security_policy = SecurityPolicy::EncryptedTransport;
        let (tx, _rx) = oneshot::channel();

        let (mut handler, handle) = ClassicPairingHandler::from_config(PEER, &config, deps(), tx);
        assert_eq!(handle.address(), PEER);
        assert_eq!(handler.session().state(), SessionState::Idle);

        handler
            .dispatch(SessionInput::Lifecycle(LifecycleEvent::Initiate(
                LocalParameters::from_config(&config, true),
            )))
            .await
            .unwrap();
        assert_eq!(handler.session().state(), SessionState::AwaitingRegistration);

        // loopback answered straight into the mailbox
        let input = handler.inbox.recv().await.unwrap();
        assert!(matches!(
            input,
            SessionInput::Lifecycle(LifecycleEvent::RegistrationComplete {
                result: RegistrationResult::Success(_)
            })
        ));
    }

    #[tokio::test]
    async fn run_stops_when_every_sender_is_gone() {
        let (tx, rx) = oneshot::channel();
        let (handler, handle) = ClassicPairingHandler::new(
            PEER,
            ServiceRegistration {
                service_id: ServiceId::CLASSIC_PAIRING_TRIGGER,
                policy: SecurityPolicy::Best,
            },
            deps(),
            tx,
        );
        drop(handle);

        let err = handler.run().await.unwrap_err();
        assert!(matches!(err, HandlerError::MailboxClosed));
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn contract_violation_stops_without_completion() {
        let (tx, rx) = oneshot::channel();
        let (handler, handle) = ClassicPairingHandler::new(
            PEER,
            ServiceRegistration {
                service_id: ServiceId::CLASSIC_PAIRING_TRIGGER,
                policy: SecurityPolicy::Best,
            },
            deps(),
            tx,
        );
        handle
            .deliver(cp_core::hci::IoCapabilityRequest { bd_addr: PEER })
            .unwrap();

        let err = handler.run().await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Contract(ContractViolation::EventBeforeRegistration(_))
        ));
        assert!(rx.await.is_err());
    }
}
