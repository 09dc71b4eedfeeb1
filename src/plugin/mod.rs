//! Plugin catalog and enabled instances.
//!
//! - `types` - Descriptors, control ports, instance ids and live values
//! - `registry` - The catalog built from a scan
//! - `instances` - The ordered list of enabled instances

pub mod instances;
pub mod registry;
pub mod types;

pub use instances::{InstanceManager, PluginInstance};
pub use registry::PluginRegistry;
pub use types::*;
