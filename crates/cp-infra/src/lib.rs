//! # cp-infra
//!
//! In-memory adapters for the `cp-core` ports and configuration loading.
//!
//! None of these talk to a controller: the channel provider loops every
//! request straight back into the session mailbox, and records live in a map.

pub mod channel;
pub mod command;
pub mod config;
pub mod security;

pub use channel::{LoopbackChannelProvider, LoopbackStats};
pub use command::RecordingCommandSender;
pub use config::{default_config_path, load_config, load_config_or_default};
pub use security::InMemorySecurityRecordStore;
