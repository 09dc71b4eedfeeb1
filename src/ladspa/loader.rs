//! Dynamic module loading.
//!
//! [`ModuleLoader`], [`PluginModule`] and [`PluginHandle`] are the only seam
//! between the host and native code.  [`DlModuleLoader`] implements them with
//! `dlopen`; every raw pointer dereference of a LADSPA descriptor lives in
//! this file.

use std::ffi::{CStr, CString, c_char, c_ulong, c_void};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::sys;
use super::types::{PortKind, RangeHint, RawDescriptor, RawPort};
use crate::error::{HostError, Result};

/// Opens native modules.
pub trait ModuleLoader: Send + Sync {
    /// Open the module at `path` and resolve its descriptor entry point.
    fn open(&self, path: &Path) -> Result<Arc<dyn PluginModule>>;
}

/// An opened module.  Dropping the last reference unloads it.
pub trait PluginModule: Send + Sync {
    /// Descriptor number `index` of the module's table, or `None` past the end.
    fn descriptor(&self, index: usize) -> Option<RawDescriptor>;

    /// Create a processing handle for descriptor `index`.
    fn instantiate(&self, index: usize, sample_rate: u32) -> Option<Box<dyn PluginHandle>>;
}

/// One instantiated processing handle.  Dropping it runs the module's
/// `cleanup`.
pub trait PluginHandle: Send {
    /// # Safety
    /// `data` must stay valid for reads and writes until the port is
    /// reconnected or the handle is dropped.
    unsafe fn connect_port(&mut self, port: usize, data: *mut f32);

    fn activate(&mut self);

    /// Process `sample_count` frames on the connected buffers.
    fn run(&mut self, sample_count: usize);

    fn deactivate(&mut self);
}

// ---------------------------------------------------------------------------
// dlopen implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct DlModuleLoader;

/// Keeps the dlopen handle alive.  Descriptors and instances hold an `Arc`
/// to this; the module is closed when the last one goes away.
struct DlLibrary {
    handle: *mut c_void,
    descriptor_fn: sys::LADSPA_Descriptor_Function,
    path: PathBuf,
}

unsafe impl Send for DlLibrary {}
unsafe impl Sync for DlLibrary {}

impl Drop for DlLibrary {
    fn drop(&mut self) {
        log::debug!("ladspa: closing module {}", self.path.display());
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

impl DlLibrary {
    fn descriptor_ptr(&self, index: usize) -> *const sys::LADSPA_Descriptor {
        unsafe { (self.descriptor_fn)(index as c_ulong) }
    }
}

struct DlModule {
    library: Arc<DlLibrary>,
}

impl ModuleLoader for DlModuleLoader {
    fn open(&self, path: &Path) -> Result<Arc<dyn PluginModule>> {
        let c_path =
            CString::new(path.as_os_str().as_bytes()).map_err(|_| HostError::ModuleOpen {
                path: path.to_path_buf(),
                reason: "path contains a NUL byte".to_string(),
            })?;

        // Safety: dlopen/dlsym are called with valid C strings; the symbol is
        // only reinterpreted as the descriptor function type it is declared as.
        unsafe {
            let handle = libc::dlopen(c_path.as_ptr(), libc::RTLD_LAZY | libc::RTLD_LOCAL);
            if handle.is_null() {
                return Err(HostError::ModuleOpen {
                    path: path.to_path_buf(),
                    reason: last_dl_error(),
                });
            }

            let sym = libc::dlsym(handle, sys::DESCRIPTOR_SYMBOL.as_ptr());
            if sym.is_null() {
                libc::dlclose(handle);
                return Err(HostError::MissingEntryPoint(path.to_path_buf()));
            }

            let descriptor_fn =
                std::mem::transmute::<*mut c_void, sys::LADSPA_Descriptor_Function>(sym);

            Ok(Arc::new(DlModule {
                library: Arc::new(DlLibrary {
                    handle,
                    descriptor_fn,
                    path: path.to_path_buf(),
                }),
            }))
        }
    }
}

impl PluginModule for DlModule {
    fn descriptor(&self, index: usize) -> Option<RawDescriptor> {
        let ptr = self.library.descriptor_ptr(index);
        if ptr.is_null() {
            return None;
        }
        // Safety: non-null descriptor pointers stay valid while the module
        // is loaded, which `self.library` guarantees.
        Some(unsafe { read_descriptor(&*ptr) })
    }

    fn instantiate(&self, index: usize, sample_rate: u32) -> Option<Box<dyn PluginHandle>> {
        let descriptor = self.library.descriptor_ptr(index);
        if descriptor.is_null() {
            return None;
        }

        let desc = unsafe { &*descriptor };
        if desc.connect_port.is_none() || desc.run.is_none() {
            log::warn!(
                "ladspa: descriptor {} of {} lacks connect_port/run",
                index,
                self.library.path.display()
            );
            return None;
        }

        let instantiate = desc.instantiate?;
        let handle = unsafe { instantiate(descriptor, sample_rate as c_ulong) };
        if handle.is_null() {
            log::warn!(
                "ladspa: instantiate failed for descriptor {} of {}",
                index,
                self.library.path.display()
            );
            return None;
        }

        Some(Box::new(DlHandle {
            _library: self.library.clone(),
            descriptor,
            handle,
        }))
    }
}

struct DlHandle {
    /// Must outlive `handle` and `descriptor`.
    _library: Arc<DlLibrary>,
    descriptor: *const sys::LADSPA_Descriptor,
    handle: sys::LADSPA_Handle,
}

unsafe impl Send for DlHandle {}

impl DlHandle {
    fn desc(&self) -> &sys::LADSPA_Descriptor {
        unsafe { &*self.descriptor }
    }
}

impl PluginHandle for DlHandle {
    unsafe fn connect_port(&mut self, port: usize, data: *mut f32) {
        if let Some(connect) = self.desc().connect_port {
            unsafe { connect(self.handle, port as c_ulong, data) };
        }
    }

    fn activate(&mut self) {
        if let Some(activate) = self.desc().activate {
            unsafe { activate(self.handle) };
        }
    }

    fn run(&mut self, sample_count: usize) {
        if let Some(run) = self.desc().run {
            unsafe { run(self.handle, sample_count as c_ulong) };
        }
    }

    fn deactivate(&mut self) {
        if let Some(deactivate) = self.desc().deactivate {
            unsafe { deactivate(self.handle) };
        }
    }
}

impl Drop for DlHandle {
    fn drop(&mut self) {
        if let Some(cleanup) = self.desc().cleanup {
            unsafe { cleanup(self.handle) };
        }
    }
}

fn last_dl_error() -> String {
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        "unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
    }
}

unsafe fn c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// Copy a descriptor out of module memory.
unsafe fn read_descriptor(desc: &sys::LADSPA_Descriptor) -> RawDescriptor {
    let count = desc.PortCount as usize;
    let mut ports = Vec::with_capacity(count);

    for i in 0..count {
        unsafe {
            let bits = if desc.PortDescriptors.is_null() {
                0
            } else {
                *desc.PortDescriptors.add(i)
            };
            let name = if desc.PortNames.is_null() {
                None
            } else {
                c_string(*desc.PortNames.add(i))
            };
            let hint = if desc.PortRangeHints.is_null() {
                RangeHint::default()
            } else {
                let h = *desc.PortRangeHints.add(i);
                RangeHint::new(h.HintDescriptor, h.LowerBound, h.UpperBound)
            };

            ports.push(RawPort {
                kind: PortKind::from_bits(bits),
                name,
                hint,
            });
        }
    }

    unsafe {
        RawDescriptor {
            unique_id: desc.UniqueID as u64,
            label: c_string(desc.Label),
            name: c_string(desc.Name),
            maker: c_string(desc.Maker),
            copyright: c_string(desc.Copyright),
            ports,
        }
    }
}
