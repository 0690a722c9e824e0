mod store;

pub use store::{JsonStore, SETTINGS_DIR};
