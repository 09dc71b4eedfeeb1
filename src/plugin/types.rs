//! Catalog and instance types shared by the registry, instance manager,
//! config codec and effect chain.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::ladspa::{PluginModule, PortKind, RawDescriptor, RawPort, resolve};

// ---------------------------------------------------------------------------
// Instance identity
// ---------------------------------------------------------------------------

/// Stable identifier of an enabled instance.  Never reused within one host,
/// so a handle kept across a disable is detectably stale rather than
/// pointing at whichever instance shifted into its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Control ports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPort {
    /// LADSPA port number within the descriptor.
    pub index: usize,
    pub name: String,
    pub is_toggle: bool,
    pub is_output: bool,
    pub is_integer: bool,
    pub is_logarithmic: bool,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ControlPort {
    /// Parse a control port.  Ports without a name are rejected.
    pub fn parse(index: usize, port: &RawPort) -> Option<Self> {
        let Some(name) = port.name.clone() else {
            log::warn!("ladspa: control port {} has no name, skipping", index);
            return None;
        };

        let range = resolve(&port.hint);

        Some(Self {
            index,
            name,
            is_toggle: port.hint.is_toggled(),
            is_output: port.kind == PortKind::ControlOutput,
            is_integer: port.hint.is_integer(),
            is_logarithmic: port.hint.is_logarithmic(),
            min: range.min,
            max: range.max,
            default: range.default,
        })
    }
}

// ---------------------------------------------------------------------------
// Descriptor (catalog entry)
// ---------------------------------------------------------------------------

pub struct PluginDescriptor {
    /// File name of the module, without directory.
    pub module_path: String,
    /// Unique within its module.
    pub label: String,
    pub name: String,
    pub maker: Option<String>,
    pub copyright: Option<String>,
    pub unique_id: u64,
    pub control_ports: Vec<ControlPort>,
    pub audio_inputs: Vec<usize>,
    pub audio_outputs: Vec<usize>,
    /// Ports the host does not use (unnamed controls, unknown kinds).  They
    /// still have to be connected before `run`.
    pub unused_ports: Vec<usize>,
    /// Position in the module's descriptor table.
    pub(crate) table_index: usize,
    /// Keeps the module loaded for as long as this descriptor exists.
    pub(crate) module: Arc<dyn PluginModule>,
}

impl PluginDescriptor {
    /// Build a catalog entry from a raw descriptor.  Returns `None` when the
    /// descriptor lacks a label or name.
    pub fn from_raw(
        module_path: &str,
        table_index: usize,
        raw: &RawDescriptor,
        module: Arc<dyn PluginModule>,
    ) -> Option<Self> {
        if module_path.is_empty() {
            return None;
        }
        let (Some(label), Some(name)) = (raw.label.clone(), raw.name.clone()) else {
            log::warn!(
                "ladspa: descriptor {} of {} has no label or name",
                table_index,
                module_path
            );
            return None;
        };

        let mut control_ports = Vec::new();
        let mut audio_inputs = Vec::new();
        let mut audio_outputs = Vec::new();
        let mut unused_ports = Vec::new();

        for (i, port) in raw.ports.iter().enumerate() {
            if port.kind.is_control() {
                match ControlPort::parse(i, port) {
                    Some(control) => control_ports.push(control),
                    None => unused_ports.push(i),
                }
                continue;
            }
            match port.kind {
                PortKind::AudioInput => audio_inputs.push(i),
                PortKind::AudioOutput => audio_outputs.push(i),
                _ => unused_ports.push(i),
            }
        }

        Some(Self {
            module_path: module_path.to_string(),
            label,
            name,
            maker: raw.maker.clone(),
            copyright: raw.copyright.clone(),
            unique_id: raw.unique_id,
            control_ports,
            audio_inputs,
            audio_outputs,
            unused_ports,
            table_index,
            module,
        })
    }

    pub fn identity(&self) -> (&str, &str) {
        (&self.module_path, &self.label)
    }

    pub fn defaults(&self) -> Vec<f32> {
        self.control_ports.iter().map(|c| c.default).collect()
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("module_path", &self.module_path)
            .field("label", &self.label)
            .field("name", &self.name)
            .field("control_ports", &self.control_ports.len())
            .field("audio_inputs", &self.audio_inputs)
            .field("audio_outputs", &self.audio_outputs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Lock-free parameter storage (shared between RT and UI threads)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(val: f32) -> Self {
        Self(AtomicU32::new(val.to_bits()))
    }
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
    pub fn store(&self, val: f32) {
        self.0.store(val.to_bits(), Ordering::Relaxed);
    }
}

/// Live parameter values of one instance, parallel to its descriptor's
/// control ports.  Values are not clamped: automation may push them outside
/// `[min, max]`.
#[derive(Debug)]
pub struct ControlValues {
    slots: Box<[AtomicF32]>,
}

impl ControlValues {
    pub fn new(values: &[f32]) -> Self {
        Self {
            slots: values.iter().map(|&v| AtomicF32::new(v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, control: usize) -> Option<f32> {
        self.slots.get(control).map(AtomicF32::load)
    }

    /// Returns `false` when `control` is out of range.
    pub fn set(&self, control: usize, value: f32) -> bool {
        match self.slots.get(control) {
            Some(slot) => {
                slot.store(value);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<f32> {
        self.slots.iter().map(AtomicF32::load).collect()
    }

    /// Copy every value into `out` (same length).
    pub fn read_into(&self, out: &mut [f32]) {
        for (dst, slot) in out.iter_mut().zip(self.slots.iter()) {
            *dst = slot.load();
        }
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// What the UI needs to list one enabled instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub id: InstanceId,
    pub module_path: String,
    pub label: String,
    pub name: String,
    pub values: Vec<f32>,
    pub selected: bool,
    pub settings_open: bool,
}

/// A per-instance settings window owned by the UI layer.  The host closes it
/// before the instance it belongs to is torn down.
pub trait SettingsView: Send {
    /// Bring an already open window to the front.
    fn present(&mut self);
    fn close(&mut self);
}
