use serde::Serialize;

use super::{AuthenticationRequirements, IoCapability, LinkKey, OobDataPresent, OpCode};
use crate::ids::BdAddr;

/// Commands the pairing core sends to the controller.
///
/// Fire-and-forget: no response correlation at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HciCommand {
    LinkKeyRequestReply {
        bd_addr: BdAddr,
        #[serde(skip)]
        link_key: LinkKey,
    },
    LinkKeyRequestNegativeReply {
        bd_addr: BdAddr,
    },
    IoCapabilityRequestReply {
        bd_addr: BdAddr,
        io_capability: IoCapability,
        oob_present: OobDataPresent,
        authentication_requirements: AuthenticationRequirements,
    },
    UserConfirmationRequestReply {
        bd_addr: BdAddr,
    },
}

impl HciCommand {
    pub fn op_code(&self) -> OpCode {
        match self {
            HciCommand::LinkKeyRequestReply { .. } => OpCode::LinkKeyRequestReply,
            HciCommand::LinkKeyRequestNegativeReply { .. } => OpCode::LinkKeyRequestNegativeReply,
            HciCommand::IoCapabilityRequestReply { .. } => OpCode::IoCapabilityRequestReply,
            HciCommand::UserConfirmationRequestReply { .. } => {
                OpCode::UserConfirmationRequestReply
            }
        }
    }

    pub fn bd_addr(&self) -> BdAddr {
        match self {
            HciCommand::LinkKeyRequestReply { bd_addr, .. }
            | HciCommand::LinkKeyRequestNegativeReply { bd_addr }
            | HciCommand::IoCapabilityRequestReply { bd_addr, .. }
            | HciCommand::UserConfirmationRequestReply { bd_addr } => *bd_addr,
        }
    }
}
