//! Classic pairing handler
//!
//! 经典配对处理器: 每个会话一个邮箱, 一次处理一个输入。

mod classic_pairing_handler;
mod error;
mod handle;

pub use classic_pairing_handler::{ClassicPairingHandler, PairingHandlerDeps};
pub use error::HandlerError;
pub use handle::PairingHandle;
