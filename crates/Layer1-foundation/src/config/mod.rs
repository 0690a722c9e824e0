//! Config - bridge settings
//!
//! - `bridge.rs` - BridgeConfig (listener, executor cadence, render capture)

mod bridge;

pub use bridge::{BridgeConfig, RenderConfig, BRIDGE_CONFIG_FILE};
