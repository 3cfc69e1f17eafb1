mod senders;

pub use senders::RecordingCommandSender;
