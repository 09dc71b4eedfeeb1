//! Host core for LADSPA effect plugins.
//!
//! Scans the LADSPA search path for modules, keeps a catalog of the plugins
//! they export, manages an ordered chain of enabled instances with live
//! parameter values, persists that chain through a settings store, and runs
//! interleaved audio through it.

pub mod config;
pub mod effect;
pub mod error;
pub mod host;
pub mod ladspa;
pub mod plugin;

#[cfg(test)]
mod testing;

pub use error::{HostError, Result};
pub use host::{HostConfig, PluginHost};
pub use plugin::{InstanceId, InstanceSummary, PluginDescriptor};
