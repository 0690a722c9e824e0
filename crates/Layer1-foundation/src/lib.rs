//! # hostbridge-foundation
//!
//! Foundation layer for hostbridge:
//! - Error: central error type shared by every layer
//! - Config: BridgeConfig (listener, executor cadence, capture settings)
//! - Storage: JsonStore for global and project settings files
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  caller ──HTTP──▶ Listener (network threads)             │
//! │                      │ enqueue                            │
//! │                      ▼                                    │
//! │                  TaskQueue                                │
//! │                      │ drain_all (once per tick)          │
//! │                      ▼                                    │
//! │       HostExecutor (host thread) ──▶ CommandHandlers      │
//! │                      │ send                               │
//! │                      ▼                                    │
//! │               ResponseChannel ──▶ Listener ──▶ caller     │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod storage;

pub use config::{BridgeConfig, RenderConfig, BRIDGE_CONFIG_FILE};
pub use error::{Error, Result};
pub use storage::{JsonStore, SETTINGS_DIR};
