use cp_core::{BdAddr, HciEvent, LifecycleEvent, LocalParameters, Mailbox, MailboxError};

/// Caller-facing side of a running pairing handler.
///
/// Everything posted here is queued behind inputs already in the mailbox.
#[derive(Debug, Clone)]
pub struct PairingHandle {
    address: BdAddr,
    mailbox: Mailbox,
}

impl PairingHandle {
    pub(super) fn new(address: BdAddr, mailbox: Mailbox) -> Self {
        Self { address, mailbox }
    }

    pub fn address(&self) -> BdAddr {
        self.address
    }

    /// Start the session. Only the first call is valid.
    pub fn initiate(&self, params: LocalParameters) -> Result<(), MailboxError> {
        self.mailbox
            .post_lifecycle(LifecycleEvent::Initiate(params))
    }

    pub fn cancel(&self) -> Result<(), MailboxError> {
        self.mailbox.post_lifecycle(LifecycleEvent::Cancel)
    }

    /// Route an HCI event to this session.
    pub fn deliver(&self, event: impl Into<HciEvent>) -> Result<(), MailboxError> {
        self.mailbox.post_hci(event)
    }

    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }
}
