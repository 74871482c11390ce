//! Configuration types
//!
//! Board-agnostic tool changer configuration, persisted as a single
//! postcard-encoded settings record.

pub mod settings;
pub mod types;

pub use settings::{AtcSettings, SettingsError, SettingsStore, SETTINGS_MAGIC, SETTINGS_VERSION};
pub use types::*;
