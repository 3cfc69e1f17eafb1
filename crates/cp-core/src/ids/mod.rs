mod bd_addr;
mod handles;

pub use bd_addr::{BdAddr, ParseBdAddrError};
pub use handles::{ChannelId, RegistrationId};
