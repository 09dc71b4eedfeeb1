//! Catalog of discovered descriptors and the modules that back them.

use std::sync::Arc;

use super::types::PluginDescriptor;
use crate::ladspa::{PluginModule, ScannedModule};

#[derive(Default)]
pub struct PluginRegistry {
    /// Every module that was opened, in scan order.
    modules: Vec<Arc<dyn PluginModule>>,
    /// Catalog in scan order.
    plugins: Vec<Arc<PluginDescriptor>>,
    /// Parallel to `plugins`; UI selection for "enable selected".
    selected: Vec<bool>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from a scan pass.  Descriptors that fail to parse,
    /// or whose `(module_path, label)` is already taken, are skipped.
    pub fn from_scan(scanned: Vec<ScannedModule>) -> Self {
        let mut registry = Self::new();

        for scan in scanned {
            for (table_index, raw) in &scan.descriptors {
                let Some(desc) = PluginDescriptor::from_raw(
                    &scan.file_name,
                    *table_index,
                    raw,
                    scan.module.clone(),
                ) else {
                    continue;
                };

                if registry.find_plugin(&desc.module_path, &desc.label).is_some() {
                    log::warn!(
                        "ladspa: duplicate plugin {}:{}, keeping the first one found",
                        desc.module_path,
                        desc.label
                    );
                    continue;
                }

                registry.plugins.push(Arc::new(desc));
                registry.selected.push(false);
            }
            registry.modules.push(scan.module);
        }

        registry
    }

    pub fn plugins(&self) -> &[Arc<PluginDescriptor>] {
        &self.plugins
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn find_plugin(&self, module_path: &str, label: &str) -> Option<&Arc<PluginDescriptor>> {
        self.plugins
            .iter()
            .find(|p| p.module_path == module_path && p.label == label)
    }

    /// Whether `plugin` is this registry's own entry (pointer identity).
    pub fn contains(&self, plugin: &Arc<PluginDescriptor>) -> bool {
        self.plugins.iter().any(|p| Arc::ptr_eq(p, plugin))
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) {
        if let Some(flag) = self.selected.get_mut(index) {
            *flag = selected;
        }
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    pub fn selected_plugins(&self) -> Vec<Arc<PluginDescriptor>> {
        self.plugins
            .iter()
            .zip(self.selected.iter())
            .filter(|(_, sel)| **sel)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Drop the catalog and release this registry's module references.
    /// Modules still referenced by live instances stay loaded until those go.
    pub fn clear(&mut self) {
        self.plugins.clear();
        self.selected.clear();
        self.modules.clear();
    }
}
