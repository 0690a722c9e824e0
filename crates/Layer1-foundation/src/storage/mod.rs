//! Settings storage
//!
//! - `json`: JSON files under the user config dir or the project root

mod json;

pub use json::{JsonStore, SETTINGS_DIR};
