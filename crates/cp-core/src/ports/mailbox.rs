use tokio::sync::mpsc;

use crate::hci::HciEvent;
use crate::session::{LifecycleEvent, SessionInput};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pairing session mailbox is closed")]
pub struct MailboxError;

/// Sending half of a pairing session's input queue.
///
/// Every collaborator callback and every routed HCI event goes through here,
/// so the session sees a single ordered stream of inputs.
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: mpsc::UnboundedSender<SessionInput>,
}

pub type MailboxReceiver = mpsc::UnboundedReceiver<SessionInput>;

/// Mailbox reference that does not keep the receiver open.
///
/// The session's own execution context holds one of these, so that the
/// receiver closes once every caller and collaborator has let go.
#[derive(Debug, Clone)]
pub struct WeakMailbox {
    tx: mpsc::WeakUnboundedSender<SessionInput>,
}

impl WeakMailbox {
    pub fn upgrade(&self) -> Option<Mailbox> {
        self.tx.upgrade().map(|tx| Mailbox { tx })
    }
}

impl Mailbox {
    pub fn channel() -> (Self, MailboxReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn post(&self, input: SessionInput) -> Result<(), MailboxError> {
        self.tx.send(input).map_err(|_| MailboxError)
    }

    pub fn post_lifecycle(&self, event: LifecycleEvent) -> Result<(), MailboxError> {
        self.post(SessionInput::Lifecycle(event))
    }

    pub fn post_hci(&self, event: impl Into<HciEvent>) -> Result<(), MailboxError> {
        self.post(SessionInput::Hci(event.into()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn downgrade(&self) -> WeakMailbox {
        WeakMailbox {
            tx: self.tx.downgrade(),
        }
    }
}
