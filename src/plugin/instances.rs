//! The ordered list of enabled plugin instances.
//!
//! List order is chain order: instances are processed, and persisted, in the
//! order they were enabled.  There is no reordering; to move an effect,
//! disable it and enable it again.

use std::sync::Arc;

use super::types::*;
use crate::effect::{AudioFormat, ProcessingState};
use crate::error::{HostError, Result};

/// One enabled activation of a descriptor.
pub struct PluginInstance {
    id: InstanceId,
    descriptor: Arc<PluginDescriptor>,
    values: Arc<ControlValues>,
    selected: bool,
    settings_view: Option<Box<dyn SettingsView>>,
    /// Set once processing has been attempted for the current audio format,
    /// whether or not the plugin could actually be started.
    pub(crate) active: bool,
    pub(crate) processing: Option<ProcessingState>,
}

impl PluginInstance {
    fn new(id: InstanceId, descriptor: Arc<PluginDescriptor>) -> Self {
        let values = Arc::new(ControlValues::new(&descriptor.defaults()));
        Self {
            id,
            descriptor,
            values,
            selected: false,
            settings_view: None,
            active: false,
            processing: None,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn descriptor(&self) -> &Arc<PluginDescriptor> {
        &self.descriptor
    }

    pub fn values(&self) -> &Arc<ControlValues> {
        &self.values
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn settings_open(&self) -> bool {
        self.settings_view.is_some()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.is_some()
    }

    pub fn summary(&self) -> InstanceSummary {
        InstanceSummary {
            id: self.id,
            module_path: self.descriptor.module_path.clone(),
            label: self.descriptor.label.clone(),
            name: self.descriptor.name.clone(),
            values: self.values.snapshot(),
            selected: self.selected,
            settings_open: self.settings_open(),
        }
    }

    /// Run one block, starting the plugin first if this is the first block
    /// since the last format change.  Unusable plugins pass audio through.
    pub(crate) fn process(&mut self, format: AudioFormat, data: &mut [f32]) {
        if !self.active {
            self.active = true;
            self.processing = ProcessingState::start(&self.descriptor, &self.values, format);
        }

        if let Some(state) = self.processing.as_mut() {
            state.run(&self.descriptor, &self.values, data, format.channels);
        }
    }

    /// Tear down processing handles (deactivate, then cleanup).
    pub(crate) fn shutdown_processing(&mut self) {
        self.active = false;
        if self.processing.take().is_some() {
            log::debug!("ladspa: shut down {} ({})", self.descriptor.name, self.id);
        }
    }
}

pub struct InstanceManager {
    instances: Vec<PluginInstance>,
    next_id: u64,
}

impl Default for InstanceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceManager {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a new instance with every control at its default.
    pub fn enable(&mut self, descriptor: Arc<PluginDescriptor>) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;

        log::info!(
            "ladspa: enabled {} ({}:{}) as {}",
            descriptor.name,
            descriptor.module_path,
            descriptor.label,
            id
        );

        self.instances.push(PluginInstance::new(id, descriptor));
        id
    }

    /// Disable an enabled instance.
    ///
    /// # Panics
    /// If `id` is not enabled; that is a bookkeeping bug in the caller.
    pub fn disable(&mut self, id: InstanceId) {
        let Some(index) = self.position(id) else {
            panic!("disable of unknown instance {}", id);
        };
        self.disable_at(index);
    }

    /// Close the settings view, tear down processing, then remove the entry.
    /// Later entries shift down by one.
    pub fn disable_at(&mut self, index: usize) {
        assert!(
            index < self.instances.len(),
            "disable_at({}) with {} instances",
            index,
            self.instances.len()
        );

        let instance = &mut self.instances[index];
        if let Some(mut view) = instance.settings_view.take() {
            view.close();
        }
        instance.shutdown_processing();

        let removed = self.instances.remove(index);
        log::info!("ladspa: disabled {} ({})", removed.descriptor.name, removed.id);
    }

    /// Disable every selected instance, keeping the rest in order.  Returns
    /// how many were removed.
    pub fn disable_selected(&mut self) -> usize {
        let count = self.instances.len();
        let mut offset = 0;

        for i in 0..count {
            if self.instances[i - offset].selected {
                self.disable_at(i - offset);
                offset += 1;
            }
        }

        offset
    }

    /// Disable everything, front to back.
    pub fn clear(&mut self) {
        while !self.instances.is_empty() {
            self.disable_at(0);
        }
    }

    pub fn position(&self, id: InstanceId) -> Option<usize> {
        self.instances.iter().position(|i| i.id == id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&PluginInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: InstanceId) -> Result<&mut PluginInstance> {
        self.instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(HostError::StaleInstance(id))
    }

    pub fn set_selected(&mut self, id: InstanceId, selected: bool) -> Result<()> {
        self.get_mut(id)?.selected = selected;
        Ok(())
    }

    /// Shared parameter storage of an instance.  Writes through it need no
    /// lock.
    pub fn controls(&self, id: InstanceId) -> Option<Arc<ControlValues>> {
        self.get(id).map(|i| i.values.clone())
    }

    pub fn set_value(&self, id: InstanceId, control: usize, value: f32) -> Result<()> {
        let instance = self.get(id).ok_or(HostError::StaleInstance(id))?;
        if instance.values.set(control, value) {
            Ok(())
        } else {
            Err(HostError::NoSuchControl { id, control })
        }
    }

    /// Attach a settings view, closing any previous one.
    pub fn attach_settings_view(
        &mut self,
        id: InstanceId,
        view: Box<dyn SettingsView>,
    ) -> Result<()> {
        let instance = self.get_mut(id)?;
        if let Some(mut old) = instance.settings_view.replace(view) {
            old.close();
        }
        Ok(())
    }

    /// Record that the UI closed an instance's settings view itself.
    pub fn detach_settings_view(&mut self, id: InstanceId) -> Result<()> {
        self.get_mut(id)?.settings_view = None;
        Ok(())
    }

    /// For each selected instance, present its settings view, or open one
    /// through `open` when it has none.
    pub fn configure_selected<F>(&mut self, mut open: F)
    where
        F: FnMut(&PluginInstance) -> Box<dyn SettingsView>,
    {
        for instance in self.instances.iter_mut().filter(|i| i.selected) {
            match instance.settings_view.as_mut() {
                Some(view) => view.present(),
                None => {
                    let view = open(instance);
                    instance.settings_view = Some(view);
                }
            }
        }
    }

    pub fn list_enabled(&self) -> Vec<InstanceSummary> {
        self.instances.iter().map(PluginInstance::summary).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PluginInstance> {
        self.instances.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, PluginInstance> {
        self.instances.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
