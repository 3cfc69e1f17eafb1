//! Command line of the pairing simulator.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use cp_core::{BdAddr, IoCapability, LinkKey};

use crate::simulator::SimulationOptions;

#[derive(Debug, Parser)]
#[command(
    name = "classic-pairing",
    version,
    about = "Run one scripted classic Secure Simple Pairing attempt against in-memory collaborators"
)]
pub struct Cli {
    /// Remote device address, AA:BB:CC:DD:EE:FF
    #[arg(long)]
    pub peer: BdAddr,

    /// Pairing config (TOML); defaults to the user config dir, then built-in defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// IO capability the scripted peer announces
    #[arg(long, value_enum, default_value_t = RemoteIo::DisplayOnly)]
    pub remote_io: RemoteIo,

    /// The peer starts the pairing, the local side answers
    #[arg(long)]
    pub responder: bool,

    /// Seed the peer's security record as bonded with this link key (32 hex digits)
    #[arg(long, value_name = "HEXKEY")]
    pub bonded: Option<LinkKey>,

    /// Make the channel provider fail every connection attempt
    #[arg(long)]
    pub fail_connection: bool,

    /// Numeric value carried by the user confirmation request
    #[arg(long, default_value_t = 123_456)]
    pub numeric_value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RemoteIo {
    DisplayOnly,
    DisplayYesNo,
    KeyboardOnly,
    NoInputNoOutput,
}

impl From<RemoteIo> for IoCapability {
    fn from(value: RemoteIo) -> Self {
        match value {
            RemoteIo::DisplayOnly => IoCapability::DisplayOnly,
            RemoteIo::DisplayYesNo => IoCapability::DisplayYesNo,
            RemoteIo::KeyboardOnly => IoCapability::KeyboardOnly,
            RemoteIo::NoInputNoOutput => IoCapability::NoInputNoOutput,
        }
    }
}

impl Cli {
    pub fn options(&self) -> SimulationOptions {
        SimulationOptions {
            peer: self.peer,
            remote_io_capability: self.remote_io.into(),
            locally_initiated: !self.responder,
            bonded_key: self.bonded.clone(),
            fail_connection: self.fail_connection,
            numeric_value: self.numeric_value,
        }
    }
}
