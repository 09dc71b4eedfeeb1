//! Settings storage and the enabled-list codec.

pub mod codec;
pub mod settings;

pub use codec::{ConfigCodec, decode_values, encode_values};
pub use settings::{JsonSettingsFile, MemorySettings, SettingsStore};
