//! Port interfaces for the application layer
//!
//! Ports define the contract between the pairing session (pure logic) and
//! the collaborators that own the transport, the controller command path and
//! the security record storage. Completions never come back as return
//! values: a collaborator posts them into the session's [`Mailbox`], and the
//! session consumes them one at a time.

mod channel_provider;
mod command_sender;
mod mailbox;
mod security_record_store;

pub use channel_provider::{
    ChannelProviderPort, ConnectionFailure, RegistrationResult, SecurityPolicy, ServiceId,
    ServiceRegistration,
};
pub use command_sender::CommandSenderPort;
pub use mailbox::{Mailbox, MailboxError, MailboxReceiver, WeakMailbox};
pub use security_record_store::{SecurityRecordStoreError, SecurityRecordStorePort};
