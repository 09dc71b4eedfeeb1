//! Persistence of the enabled list.
//!
//! Layout within the section:
//!
//! ```text
//! plugin_count        = N
//! plugin{i}_path      = module file name
//! plugin{i}_label     = descriptor label
//! plugin{i}_controls  = comma-separated values, one per control port
//! ```
//!
//! Older settings stored one `plugin{i}_control{c}` double per port.  Those
//! keys are read when `plugin{i}_controls` is unusable and are erased once
//! read.

use crate::plugin::{InstanceManager, PluginRegistry};

use super::settings::SettingsStore;

pub const COUNT_KEY: &str = "plugin_count";

fn path_key(i: usize) -> String {
    format!("plugin{}_path", i)
}

fn label_key(i: usize) -> String {
    format!("plugin{}_label", i)
}

fn controls_key(i: usize) -> String {
    format!("plugin{}_controls", i)
}

fn legacy_control_key(i: usize, c: usize) -> String {
    format!("plugin{}_control{}", i, c)
}

/// Join values with `,`.  `f32` display is the shortest text that parses
/// back to the same bits.
pub fn encode_values(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a controls string.  `None` unless every item parses and there are
/// exactly `expected` of them.
pub fn decode_values(text: &str, expected: usize) -> Option<Vec<f32>> {
    if text.trim().is_empty() {
        return (expected == 0).then(Vec::new);
    }

    let values = text
        .split(',')
        .map(|item| item.trim().parse::<f32>().ok())
        .collect::<Option<Vec<_>>>()?;

    (values.len() == expected).then_some(values)
}

/// Reads and writes the enabled list in one settings section.
#[derive(Debug, Clone, Copy)]
pub struct ConfigCodec<'a> {
    section: &'a str,
}

impl<'a> ConfigCodec<'a> {
    pub fn new(section: &'a str) -> Self {
        Self { section }
    }

    /// Write every enabled instance in list order, then blank the entries
    /// left over from a longer list.
    pub fn save_enabled(&self, store: &mut dyn SettingsStore, instances: &InstanceManager) {
        let old_count = store
            .get_int(self.section, COUNT_KEY)
            .map_or(0, |n| n.max(0) as usize);

        store.set_int(self.section, COUNT_KEY, instances.len() as i64);

        for (i, instance) in instances.iter().enumerate() {
            let descriptor = instance.descriptor();
            store.set_string(self.section, &path_key(i), &descriptor.module_path);
            store.set_string(self.section, &label_key(i), &descriptor.label);
            store.set_string(
                self.section,
                &controls_key(i),
                &encode_values(&instance.values().snapshot()),
            );
        }

        for i in instances.len()..old_count {
            store.set_string(self.section, &path_key(i), "");
            store.set_string(self.section, &label_key(i), "");
            store.set_string(self.section, &controls_key(i), "");
        }

        log::debug!(
            "ladspa: saved {} enabled plugins (previously {})",
            instances.len(),
            old_count
        );
    }

    /// Enable every saved entry that the registry still knows, restoring its
    /// values.  Returns how many were enabled.
    pub fn load_enabled(
        &self,
        store: &mut dyn SettingsStore,
        registry: &PluginRegistry,
        instances: &mut InstanceManager,
    ) -> usize {
        let count = store
            .get_int(self.section, COUNT_KEY)
            .map_or(0, |n| n.max(0) as usize);
        let mut loaded = 0;

        for i in 0..count {
            let path = store
                .get_string(self.section, &path_key(i))
                .unwrap_or_default();
            let label = store
                .get_string(self.section, &label_key(i))
                .unwrap_or_default();

            let Some(descriptor) = registry.find_plugin(&path, &label) else {
                log::debug!("ladspa: saved plugin {}:{} not found, dropping", path, label);
                continue;
            };

            let id = instances.enable(descriptor.clone());
            let Some(values) = instances.controls(id) else {
                continue;
            };
            let expected = values.len();

            let stored = store.get_string(self.section, &controls_key(i));
            match stored.as_deref().and_then(|s| decode_values(s, expected)) {
                Some(decoded) => {
                    for (c, v) in decoded.into_iter().enumerate() {
                        values.set(c, v);
                    }
                }
                None => {
                    match stored.as_deref() {
                        Some(text) if !text.is_empty() => log::warn!(
                            "ladspa: stored controls for {}:{} do not match its {} ports, \
                             reading per-control keys",
                            path,
                            label,
                            expected
                        ),
                        _ => log::debug!(
                            "ladspa: no controls string for {}:{}, reading per-control keys",
                            path,
                            label
                        ),
                    }

                    for c in 0..expected {
                        let key = legacy_control_key(i, c);
                        if let Some(v) = store.get_double(self.section, &key) {
                            values.set(c, v as f32);
                        }
                        store.set_string(self.section, &key, "");
                    }
                }
            }

            loaded += 1;
        }

        log::info!("ladspa: restored {} of {} saved plugins", loaded, count);
        loaded
    }
}
