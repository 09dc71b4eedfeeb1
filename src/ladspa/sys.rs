//! Raw LADSPA 1.1 ABI: the `LADSPA_Descriptor` layout and its flag bits.
//!
//! Only `ladspa::loader` dereferences these structs.

#![allow(non_camel_case_types, non_snake_case)]

use std::ffi::{c_char, c_int, c_ulong, c_void};

pub type LADSPA_Data = f32;
pub type LADSPA_Handle = *mut c_void;
pub type LADSPA_Properties = c_int;
pub type LADSPA_PortDescriptor = c_int;
pub type LADSPA_PortRangeHintDescriptor = c_int;

/// Symbol every LADSPA module exports.
pub const DESCRIPTOR_SYMBOL: &std::ffi::CStr = c"ladspa_descriptor";

pub type LADSPA_Descriptor_Function =
    unsafe extern "C" fn(index: c_ulong) -> *const LADSPA_Descriptor;

// ---------------------------------------------------------------------------
// Port descriptor bits
// ---------------------------------------------------------------------------

pub const PORT_INPUT: LADSPA_PortDescriptor = 0x1;
pub const PORT_OUTPUT: LADSPA_PortDescriptor = 0x2;
pub const PORT_CONTROL: LADSPA_PortDescriptor = 0x4;
pub const PORT_AUDIO: LADSPA_PortDescriptor = 0x8;

// ---------------------------------------------------------------------------
// Range hint bits
// ---------------------------------------------------------------------------

pub const HINT_BOUNDED_BELOW: LADSPA_PortRangeHintDescriptor = 0x1;
pub const HINT_BOUNDED_ABOVE: LADSPA_PortRangeHintDescriptor = 0x2;
pub const HINT_TOGGLED: LADSPA_PortRangeHintDescriptor = 0x4;
pub const HINT_SAMPLE_RATE: LADSPA_PortRangeHintDescriptor = 0x8;
pub const HINT_LOGARITHMIC: LADSPA_PortRangeHintDescriptor = 0x10;
pub const HINT_INTEGER: LADSPA_PortRangeHintDescriptor = 0x20;

/// The default category is an enumeration packed into these bits, not a set
/// of independent flags.
pub const HINT_DEFAULT_MASK: LADSPA_PortRangeHintDescriptor = 0x3C0;
pub const HINT_DEFAULT_NONE: LADSPA_PortRangeHintDescriptor = 0x0;
pub const HINT_DEFAULT_MINIMUM: LADSPA_PortRangeHintDescriptor = 0x40;
pub const HINT_DEFAULT_LOW: LADSPA_PortRangeHintDescriptor = 0x80;
pub const HINT_DEFAULT_MIDDLE: LADSPA_PortRangeHintDescriptor = 0xC0;
pub const HINT_DEFAULT_HIGH: LADSPA_PortRangeHintDescriptor = 0x100;
pub const HINT_DEFAULT_MAXIMUM: LADSPA_PortRangeHintDescriptor = 0x140;
pub const HINT_DEFAULT_0: LADSPA_PortRangeHintDescriptor = 0x200;
pub const HINT_DEFAULT_1: LADSPA_PortRangeHintDescriptor = 0x240;
pub const HINT_DEFAULT_100: LADSPA_PortRangeHintDescriptor = 0x280;
pub const HINT_DEFAULT_440: LADSPA_PortRangeHintDescriptor = 0x2C0;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LADSPA_PortRangeHint {
    pub HintDescriptor: LADSPA_PortRangeHintDescriptor,
    pub LowerBound: LADSPA_Data,
    pub UpperBound: LADSPA_Data,
}

#[repr(C)]
pub struct LADSPA_Descriptor {
    pub UniqueID: c_ulong,
    pub Label: *const c_char,
    pub Properties: LADSPA_Properties,
    pub Name: *const c_char,
    pub Maker: *const c_char,
    pub Copyright: *const c_char,
    pub PortCount: c_ulong,
    pub PortDescriptors: *const LADSPA_PortDescriptor,
    pub PortNames: *const *const c_char,
    pub PortRangeHints: *const LADSPA_PortRangeHint,
    pub ImplementationData: *mut c_void,
    pub instantiate: Option<
        unsafe extern "C" fn(descriptor: *const LADSPA_Descriptor, sample_rate: c_ulong)
            -> LADSPA_Handle,
    >,
    pub connect_port:
        Option<unsafe extern "C" fn(instance: LADSPA_Handle, port: c_ulong, data: *mut LADSPA_Data)>,
    pub activate: Option<unsafe extern "C" fn(instance: LADSPA_Handle)>,
    pub run: Option<unsafe extern "C" fn(instance: LADSPA_Handle, sample_count: c_ulong)>,
    pub run_adding: Option<unsafe extern "C" fn(instance: LADSPA_Handle, sample_count: c_ulong)>,
    pub set_run_adding_gain: Option<unsafe extern "C" fn(instance: LADSPA_Handle, gain: LADSPA_Data)>,
    pub deactivate: Option<unsafe extern "C" fn(instance: LADSPA_Handle)>,
    pub cleanup: Option<unsafe extern "C" fn(instance: LADSPA_Handle)>,
}
