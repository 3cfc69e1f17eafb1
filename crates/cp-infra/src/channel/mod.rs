mod loopback;

pub use loopback::{LoopbackChannelProvider, LoopbackStats};
