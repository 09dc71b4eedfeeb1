//! Owned, safe copies of what a module's descriptor table reports.
//!
//! The loader converts each `LADSPA_Descriptor` into a [`RawDescriptor`] so
//! that nothing outside `ladspa::loader` touches module memory directly.

use super::sys;

/// Hint bits and raw bounds for one port, exactly as the module declared them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeHint {
    pub hints: i32,
    pub lower: f32,
    pub upper: f32,
}

impl RangeHint {
    pub fn new(hints: i32, lower: f32, upper: f32) -> Self {
        Self {
            hints,
            lower,
            upper,
        }
    }

    #[inline]
    pub fn has(&self, flag: i32) -> bool {
        self.hints & flag != 0
    }

    /// The packed default category (one of the `HINT_DEFAULT_*` values).
    #[inline]
    pub fn default_kind(&self) -> i32 {
        self.hints & sys::HINT_DEFAULT_MASK
    }

    pub fn is_bounded_below(&self) -> bool {
        self.has(sys::HINT_BOUNDED_BELOW)
    }

    pub fn is_bounded_above(&self) -> bool {
        self.has(sys::HINT_BOUNDED_ABOVE)
    }

    pub fn is_toggled(&self) -> bool {
        self.has(sys::HINT_TOGGLED)
    }

    pub fn is_sample_rate(&self) -> bool {
        self.has(sys::HINT_SAMPLE_RATE)
    }

    pub fn is_logarithmic(&self) -> bool {
        self.has(sys::HINT_LOGARITHMIC)
    }

    pub fn is_integer(&self) -> bool {
        self.has(sys::HINT_INTEGER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    AudioInput,
    AudioOutput,
    ControlInput,
    ControlOutput,
    /// Neither audio nor control; the host leaves these unconnected.
    Other,
}

impl PortKind {
    pub fn from_bits(bits: i32) -> Self {
        let output = bits & sys::PORT_OUTPUT != 0;
        if bits & sys::PORT_CONTROL != 0 {
            if output {
                Self::ControlOutput
            } else {
                Self::ControlInput
            }
        } else if bits & sys::PORT_AUDIO != 0 {
            if bits & sys::PORT_INPUT != 0 {
                Self::AudioInput
            } else if output {
                Self::AudioOutput
            } else {
                Self::Other
            }
        } else {
            Self::Other
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, Self::ControlInput | Self::ControlOutput)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPort {
    pub kind: PortKind,
    pub name: Option<String>,
    pub hint: RangeHint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDescriptor {
    pub unique_id: u64,
    pub label: Option<String>,
    pub name: Option<String>,
    pub maker: Option<String>,
    pub copyright: Option<String>,
    pub ports: Vec<RawPort>,
}
