use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Handle of a fixed-channel service registration, minted by the channel provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(u64);

/// Handle of an open fixed channel, minted by the channel provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(u64);

macro_rules! impl_handle {
    ($name:ident, $prefix:literal) => {
        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(&self) -> u64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

impl_handle!(RegistrationId, "registration");
impl_handle!(ChannelId, "channel");
