//! Classic Pairing
//!
//! 经典蓝牙安全简单配对 (SSP) 模拟器: 把配对核心与内存适配器接在一起,
//! 用脚本化的对端走完一次配对。

pub mod bootstrap;
pub mod simulator;

pub use simulator::{run_simulation, SimulationOptions, SimulationReport};
