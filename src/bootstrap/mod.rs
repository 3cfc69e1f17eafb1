//! Process setup: command line and logging.

pub mod cli;
pub mod tracing;
