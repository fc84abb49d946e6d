//! Durable key/value storage of installed-state flags.
//!
//! The reconciliation engine only ever sees the [`SettingsStore`] trait.
//! [`FileSettingsStore`] persists to a YAML file; [`MemorySettingsStore`]
//! keeps everything in a map and is what tests use.

pub mod keys;
pub mod store;

pub use keys::{is_truthy, variant_flag_key, FLAG_TRUE};
pub use store::{FileSettingsStore, MemorySettingsStore, SettingsStore};
