//! In-memory stand-ins for native modules and directories, used by the unit
//! tests across the crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{HostError, Result};
use crate::ladspa::{
    DirectoryLister, ModuleLoader, PluginHandle, PluginModule, PortKind, RangeHint, RawDescriptor,
    RawPort, sys,
};

pub fn audio_in(name: &str) -> RawPort {
    RawPort {
        kind: PortKind::AudioInput,
        name: Some(name.to_string()),
        hint: RangeHint::default(),
    }
}

pub fn audio_out(name: &str) -> RawPort {
    RawPort {
        kind: PortKind::AudioOutput,
        name: Some(name.to_string()),
        hint: RangeHint::default(),
    }
}

pub fn control_in(name: &str, hint: RangeHint) -> RawPort {
    RawPort {
        kind: PortKind::ControlInput,
        name: Some(name.to_string()),
        hint,
    }
}

pub fn control_out(name: &str) -> RawPort {
    RawPort {
        kind: PortKind::ControlOutput,
        name: Some(name.to_string()),
        hint: RangeHint::default(),
    }
}

/// Mono amplifier: one audio in, one audio out, `Gain` in `[0, 10]`
/// defaulting to 1 and a `Mute` toggle defaulting to 0.
pub fn amp_descriptor(label: &str) -> RawDescriptor {
    RawDescriptor {
        unique_id: 1048,
        label: Some(label.to_string()),
        name: Some(format!("Amp {}", label)),
        maker: Some("Test".to_string()),
        copyright: None,
        ports: vec![
            control_in(
                "Gain",
                RangeHint::new(
                    sys::HINT_BOUNDED_BELOW | sys::HINT_BOUNDED_ABOVE | sys::HINT_DEFAULT_1,
                    0.0,
                    10.0,
                ),
            ),
            control_in("Mute", RangeHint::new(sys::HINT_TOGGLED | sys::HINT_DEFAULT_0, 0.0, 0.0)),
            audio_in("Input"),
            audio_out("Output"),
        ],
    }
}

/// Counters shared by every handle a [`FakeModule`] creates.
#[derive(Debug, Default)]
pub struct HandleStats {
    pub instantiated: AtomicUsize,
    pub activated: AtomicUsize,
    pub deactivated: AtomicUsize,
    pub cleaned_up: AtomicUsize,
    pub frames_run: AtomicUsize,
    /// `run` calls made while some port was still unconnected.
    pub unconnected_runs: AtomicUsize,
}

impl HandleStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct FakeModule {
    descriptors: Vec<RawDescriptor>,
    stats: Arc<HandleStats>,
}

impl FakeModule {
    pub fn new(descriptors: Vec<RawDescriptor>) -> Self {
        Self {
            descriptors,
            stats: Arc::new(HandleStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<HandleStats> {
        self.stats.clone()
    }
}

impl PluginModule for FakeModule {
    fn descriptor(&self, index: usize) -> Option<RawDescriptor> {
        self.descriptors.get(index).cloned()
    }

    fn instantiate(&self, index: usize, _sample_rate: u32) -> Option<Box<dyn PluginHandle>> {
        let descriptor = self.descriptors.get(index)?.clone();
        self.stats.instantiated.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(FakeHandle {
            descriptor,
            ports: HashMap::new(),
            stats: self.stats.clone(),
        }))
    }
}

/// Multiplies each audio input into the matching output by the first
/// control input, and writes the frame count into every control output.
struct FakeHandle {
    descriptor: RawDescriptor,
    ports: HashMap<usize, *mut f32>,
    stats: Arc<HandleStats>,
}

unsafe impl Send for FakeHandle {}

impl FakeHandle {
    fn indices(&self, kind: PortKind) -> Vec<usize> {
        self.descriptor
            .ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }
}

impl PluginHandle for FakeHandle {
    unsafe fn connect_port(&mut self, port: usize, data: *mut f32) {
        self.ports.insert(port, data);
    }

    fn activate(&mut self) {
        self.stats.activated.fetch_add(1, Ordering::SeqCst);
    }

    fn run(&mut self, sample_count: usize) {
        self.stats.frames_run.fetch_add(sample_count, Ordering::SeqCst);
        if self.ports.len() < self.descriptor.ports.len() {
            self.stats.unconnected_runs.fetch_add(1, Ordering::SeqCst);
        }

        let gain = self
            .indices(PortKind::ControlInput)
            .first()
            .and_then(|i| self.ports.get(i))
            .map(|&p| unsafe { *p })
            .unwrap_or(1.0);

        let inputs = self.indices(PortKind::AudioInput);
        let outputs = self.indices(PortKind::AudioOutput);
        for (i, o) in inputs.iter().zip(outputs.iter()) {
            let (Some(&src), Some(&dst)) = (self.ports.get(i), self.ports.get(o)) else {
                continue;
            };
            for n in 0..sample_count {
                unsafe { *dst.add(n) = *src.add(n) * gain };
            }
        }

        for o in self.indices(PortKind::ControlOutput) {
            if let Some(&p) = self.ports.get(&o) {
                unsafe { *p = sample_count as f32 };
            }
        }
    }

    fn deactivate(&mut self) {
        self.stats.deactivated.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.stats.cleaned_up.fetch_add(1, Ordering::SeqCst);
    }
}

enum FakeEntry {
    Module(Arc<FakeModule>),
    MissingEntryPoint,
}

#[derive(Default)]
pub struct FakeLoader {
    entries: HashMap<PathBuf, FakeEntry>,
    opens: AtomicUsize,
}

impl FakeLoader {
    pub fn with_module(mut self, path: impl Into<PathBuf>, module: FakeModule) -> Self {
        self.entries
            .insert(path.into(), FakeEntry::Module(Arc::new(module)));
        self
    }

    pub fn with_missing_entry_point(mut self, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(path.into(), FakeEntry::MissingEntryPoint);
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ModuleLoader for FakeLoader {
    fn open(&self, path: &Path) -> Result<Arc<dyn PluginModule>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(path) {
            Some(FakeEntry::Module(m)) => Ok(m.clone()),
            Some(FakeEntry::MissingEntryPoint) => {
                Err(HostError::MissingEntryPoint(path.to_path_buf()))
            }
            None => Err(HostError::ModuleOpen {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeLister {
    dirs: HashMap<PathBuf, Vec<String>>,
}

impl FakeLister {
    pub fn with_dir(mut self, dir: impl Into<PathBuf>, names: Vec<String>) -> Self {
        self.dirs.insert(dir.into(), names);
        self
    }
}

impl DirectoryLister for FakeLister {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        self.dirs
            .get(dir)
            .cloned()
            .ok_or_else(|| HostError::DirectoryRead {
                path: dir.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

/// A module file name with the platform suffix.
pub fn module_file(stem: &str) -> String {
    format!("{}{}", stem, std::env::consts::DLL_SUFFIX)
}
