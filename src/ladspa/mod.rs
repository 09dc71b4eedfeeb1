//! LADSPA module handling.
//!
//! ## Architecture
//!
//! - `sys` - Raw C ABI of `LADSPA_Descriptor`
//! - `types` - Owned copies of descriptors and port hints
//! - `loader` - dlopen-backed module loading behind the `ModuleLoader` trait
//! - `ranges` - Hint bits to `{min, max, default}`
//! - `scanner` - Search-path walking and descriptor enumeration

pub mod loader;
pub mod ranges;
pub mod scanner;
pub mod sys;
pub mod types;

pub use loader::{DlModuleLoader, ModuleLoader, PluginHandle, PluginModule};
pub use ranges::{ControlRange, resolve};
pub use scanner::{DirectoryLister, FsLister, ModuleScanner, ScannedModule, search_paths};
pub use types::{PortKind, RangeHint, RawDescriptor, RawPort};
