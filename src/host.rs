//! The host context: catalog, enabled chain and settings behind one lock.
//!
//! Every structural change (scan, enable, disable, save, load) and every
//! audio block runs with the state lock held, so an instance is only torn
//! down between blocks.  Parameter writes through [`PluginHost::controls`]
//! bypass the lock entirely.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::codec::COUNT_KEY;
use crate::config::{ConfigCodec, SettingsStore};
use crate::effect::{self, AudioFormat};
use crate::error::{HostError, Result};
use crate::ladspa::scanner::LADSPA_PATH_ENV;
use crate::ladspa::{
    DirectoryLister, DlModuleLoader, FsLister, ModuleLoader, ModuleScanner, search_paths,
};
use crate::plugin::{
    ControlValues, InstanceId, InstanceManager, InstanceSummary, PluginDescriptor, PluginInstance,
    PluginRegistry, SettingsView,
};

pub const DEFAULT_SECTION: &str = "ladspa";
pub const MODULE_PATH_KEY: &str = "module_path";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Colon-separated directories searched before the user's module path.
    pub env_path: Option<String>,
    /// Settings section holding the module path and the enabled list.
    pub section: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            env_path: None,
            section: DEFAULT_SECTION.to_string(),
        }
    }
}

impl HostConfig {
    /// Default section, search path taken from `LADSPA_PATH`.
    pub fn from_env() -> Self {
        Self {
            env_path: std::env::var(LADSPA_PATH_ENV).ok(),
            ..Self::default()
        }
    }
}

struct HostState {
    settings: Box<dyn SettingsStore>,
    module_path: String,
    registry: PluginRegistry,
    instances: InstanceManager,
    format: Option<AudioFormat>,
}

pub struct PluginHost {
    config: HostConfig,
    loader: Box<dyn ModuleLoader>,
    lister: Box<dyn DirectoryLister>,
    state: Mutex<HostState>,
}

impl PluginHost {
    /// A host that loads native modules from the filesystem.
    pub fn new(config: HostConfig, settings: Box<dyn SettingsStore>) -> Self {
        Self::with_backends(
            config,
            settings,
            Box::new(DlModuleLoader),
            Box::new(FsLister),
        )
    }

    pub fn with_backends(
        config: HostConfig,
        settings: Box<dyn SettingsStore>,
        loader: Box<dyn ModuleLoader>,
        lister: Box<dyn DirectoryLister>,
    ) -> Self {
        Self {
            config,
            loader,
            lister,
            state: Mutex::new(HostState {
                settings,
                module_path: String::new(),
                registry: PluginRegistry::new(),
                instances: InstanceManager::new(),
                format: None,
            }),
        }
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    /// Read the module path, scan, and restore the saved chain.
    pub fn init(&self) {
        let section = self.config.section.as_str();
        let mut st = self.state.lock();

        st.settings
            .set_defaults(section, &[(COUNT_KEY, "0"), (MODULE_PATH_KEY, "")]);
        st.module_path = st
            .settings
            .get_string(section, MODULE_PATH_KEY)
            .unwrap_or_default();

        self.load(&mut st);
    }

    /// Save everything, unload every instance and module, and flush the
    /// settings store.
    pub fn cleanup(&self) -> Result<()> {
        let section = self.config.section.as_str();
        let mut st = self.state.lock();

        let module_path = st.module_path.clone();
        st.settings.set_string(section, MODULE_PATH_KEY, &module_path);
        self.unload(&mut st);

        st.settings.flush()
    }

    /// Change the user module path and rescan.  The enabled chain is saved
    /// first and restored against the new catalog.
    pub fn set_module_path(&self, path: &str) {
        let section = self.config.section.as_str();
        let mut st = self.state.lock();

        self.unload(&mut st);
        st.module_path = path.to_string();
        st.settings.set_string(section, MODULE_PATH_KEY, path);
        self.load(&mut st);
    }

    pub fn module_path(&self) -> String {
        self.state.lock().module_path.clone()
    }

    fn load(&self, st: &mut HostState) {
        let dirs = search_paths(self.config.env_path.as_deref(), &st.module_path);
        let scanned = ModuleScanner::new(self.loader.as_ref(), self.lister.as_ref()).scan(&dirs);
        st.registry = PluginRegistry::from_scan(scanned);

        let HostState {
            settings,
            registry,
            instances,
            ..
        } = st;
        ConfigCodec::new(&self.config.section).load_enabled(settings.as_mut(), registry, instances);
    }

    fn unload(&self, st: &mut HostState) {
        ConfigCodec::new(&self.config.section).save_enabled(st.settings.as_mut(), &st.instances);
        st.instances.clear();
        st.registry.clear();
    }

    // ─── Catalog ───────────────────────────────────────────────────────────

    pub fn plugins(&self) -> Vec<Arc<PluginDescriptor>> {
        self.state.lock().registry.plugins().to_vec()
    }

    pub fn find_plugin(&self, module_path: &str, label: &str) -> Option<Arc<PluginDescriptor>> {
        self.state
            .lock()
            .registry
            .find_plugin(module_path, label)
            .cloned()
    }

    pub fn set_plugin_selected(&self, index: usize, selected: bool) {
        self.state.lock().registry.set_selected(index, selected);
    }

    // ─── Enabled chain ─────────────────────────────────────────────────────

    /// Append an instance of `descriptor` to the chain.
    ///
    /// # Panics
    /// If `descriptor` does not come from this host's current catalog.
    pub fn enable(&self, descriptor: &Arc<PluginDescriptor>) -> InstanceId {
        let mut st = self.state.lock();
        assert!(
            st.registry.contains(descriptor),
            "enable of {}:{} which is not in the catalog",
            descriptor.module_path,
            descriptor.label
        );
        st.instances.enable(descriptor.clone())
    }

    /// Enable every selected catalog entry, in catalog order.
    pub fn enable_selected(&self) -> Vec<InstanceId> {
        let mut st = self.state.lock();
        let selected = st.registry.selected_plugins();
        selected
            .into_iter()
            .map(|descriptor| st.instances.enable(descriptor))
            .collect()
    }

    /// # Panics
    /// If `id` is not enabled.
    pub fn disable(&self, id: InstanceId) {
        self.state.lock().instances.disable(id);
    }

    pub fn disable_selected(&self) -> usize {
        self.state.lock().instances.disable_selected()
    }

    pub fn set_instance_selected(&self, id: InstanceId, selected: bool) -> Result<()> {
        self.state.lock().instances.set_selected(id, selected)
    }

    pub fn list_enabled(&self) -> Vec<InstanceSummary> {
        self.state.lock().instances.list_enabled()
    }

    /// Shared parameter storage of an instance.  Writes through the returned
    /// handle take no lock and are picked up on the next audio block.
    pub fn controls(&self, id: InstanceId) -> Option<Arc<ControlValues>> {
        self.state.lock().instances.controls(id)
    }

    pub fn value(&self, id: InstanceId, control: usize) -> Result<f32> {
        let values = self.controls(id).ok_or(HostError::StaleInstance(id))?;
        values
            .get(control)
            .ok_or(HostError::NoSuchControl { id, control })
    }

    pub fn set_value(&self, id: InstanceId, control: usize, value: f32) -> Result<()> {
        self.state.lock().instances.set_value(id, control, value)
    }

    // ─── Settings views ────────────────────────────────────────────────────

    pub fn configure_selected<F>(&self, open: F)
    where
        F: FnMut(&PluginInstance) -> Box<dyn SettingsView>,
    {
        self.state.lock().instances.configure_selected(open);
    }

    pub fn attach_settings_view(&self, id: InstanceId, view: Box<dyn SettingsView>) -> Result<()> {
        self.state.lock().instances.attach_settings_view(id, view)
    }

    pub fn detach_settings_view(&self, id: InstanceId) -> Result<()> {
        self.state.lock().instances.detach_settings_view(id)
    }

    // ─── Audio ─────────────────────────────────────────────────────────────

    /// Begin a stream.  Running instances are shut down and restart on the
    /// next block with the new format.
    pub fn start(&self, channels: usize, rate: u32) {
        let mut st = self.state.lock();
        log::info!("ladspa: starting stream, {} channels at {} Hz", channels, rate);
        st.format = Some(AudioFormat { channels, rate });
        effect::start(&mut st.instances);
    }

    /// Run one interleaved block through the chain in place.  Audio passes
    /// through untouched before [`start`](Self::start).
    pub fn process(&self, data: &mut [f32]) {
        let mut st = self.state.lock();
        let Some(format) = st.format else {
            return;
        };
        effect::process(&mut st.instances, format, data);
    }

    pub fn flush(&self) {
        effect::flush(&mut self.state.lock().instances);
    }

    /// The final block of a stream.
    pub fn finish(&self, data: &mut [f32], _end_of_playback: bool) {
        self.process(data);
    }
}
