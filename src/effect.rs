//! Real-time processing of the enabled chain.
//!
//! Each enabled instance is started lazily on the first block after
//! `start`: one module handle per group of channels its audio ports cover,
//! all sharing the instance's control buffer.  Blocks are interleaved
//! `f32` frames; they are split into per-channel buffers of at most
//! [`BLOCK_FRAMES`] frames, run through each handle, and written back.

use crate::ladspa::PluginHandle;
use crate::plugin::{ControlValues, InstanceManager, PluginDescriptor};

/// Largest chunk handed to a module's `run` in one call.
pub const BLOCK_FRAMES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub channels: usize,
    pub rate: u32,
}

/// Handles and buffers of one running instance.  The buffers are boxed
/// slices that are never resized, so the pointers handed to the module stay
/// valid until this is dropped.
pub struct ProcessingState {
    handles: Vec<Box<dyn PluginHandle>>,
    controls: Box<[f32]>,
    /// One slot per port the host ignores.
    _scratch: Box<[f32]>,
    in_bufs: Vec<Box<[f32]>>,
    out_bufs: Vec<Box<[f32]>>,
}

impl ProcessingState {
    /// Instantiate, connect and activate enough handles to cover every
    /// channel.  Returns `None` (after logging) when the plugin cannot be
    /// used with this format.
    pub fn start(
        descriptor: &PluginDescriptor,
        values: &ControlValues,
        format: AudioFormat,
    ) -> Option<Self> {
        let ports = descriptor.audio_inputs.len();
        if ports == 0 || ports != descriptor.audio_outputs.len() {
            log::warn!(
                "ladspa: plugin has unusable port configuration: {}",
                descriptor.name
            );
            return None;
        }

        if format.channels % ports != 0 {
            log::warn!(
                "ladspa: plugin cannot be used with {} channels: {}",
                format.channels,
                descriptor.name
            );
            return None;
        }

        let mut controls: Box<[f32]> = values.snapshot().into_boxed_slice();
        let mut scratch = vec![0.0f32; descriptor.unused_ports.len()].into_boxed_slice();
        let mut in_bufs: Vec<Box<[f32]>> = (0..format.channels)
            .map(|_| vec![0.0; BLOCK_FRAMES].into_boxed_slice())
            .collect();
        let mut out_bufs: Vec<Box<[f32]>> = (0..format.channels)
            .map(|_| vec![0.0; BLOCK_FRAMES].into_boxed_slice())
            .collect();

        let count = format.channels / ports;
        let mut handles = Vec::with_capacity(count);

        for i in 0..count {
            let Some(mut handle) = descriptor
                .module
                .instantiate(descriptor.table_index, format.rate)
            else {
                log::warn!("ladspa: failed to instantiate {}", descriptor.name);
                return None;
            };

            // Safety: every buffer is a boxed slice owned by the state built
            // below and outlives the handle, which is dropped first.
            unsafe {
                for (c, control) in descriptor.control_ports.iter().enumerate() {
                    handle.connect_port(control.index, controls.as_mut_ptr().add(c));
                }
                for (s, &port) in descriptor.unused_ports.iter().enumerate() {
                    handle.connect_port(port, scratch.as_mut_ptr().add(s));
                }
                for p in 0..ports {
                    let channel = ports * i + p;
                    handle.connect_port(descriptor.audio_inputs[p], in_bufs[channel].as_mut_ptr());
                    handle.connect_port(
                        descriptor.audio_outputs[p],
                        out_bufs[channel].as_mut_ptr(),
                    );
                }
            }

            handles.push(handle);
        }

        for handle in &mut handles {
            handle.activate();
        }

        log::debug!(
            "ladspa: started {} with {} handles at {} Hz",
            descriptor.name,
            count,
            format.rate
        );

        Some(Self {
            handles,
            controls,
            _scratch: scratch,
            in_bufs,
            out_bufs,
        })
    }

    /// Run the interleaved `data` through every handle in place.
    pub fn run(
        &mut self,
        descriptor: &PluginDescriptor,
        values: &ControlValues,
        data: &mut [f32],
        channels: usize,
    ) {
        let ports = descriptor.audio_inputs.len();
        let frames = data.len() / channels;
        let mut done = 0;

        while done < frames {
            let chunk = (frames - done).min(BLOCK_FRAMES);
            let block = &mut data[done * channels..(done + chunk) * channels];

            values.read_into(&mut self.controls);

            for (i, handle) in self.handles.iter_mut().enumerate() {
                for p in 0..ports {
                    let channel = ports * i + p;
                    let buf = &mut self.in_bufs[channel];
                    for (f, frame) in block.chunks_exact(channels).enumerate() {
                        buf[f] = frame[channel];
                    }
                }

                handle.run(chunk);

                for p in 0..ports {
                    let channel = ports * i + p;
                    let buf = &self.out_bufs[channel];
                    for (f, frame) in block.chunks_exact_mut(channels).enumerate() {
                        frame[channel] = buf[f];
                    }
                }
            }

            for (c, control) in descriptor.control_ports.iter().enumerate() {
                if control.is_output {
                    values.set(c, self.controls[c]);
                }
            }

            done += chunk;
        }
    }

    /// Reset internal module state between unrelated streams.
    pub fn flush(&mut self) {
        for handle in &mut self.handles {
            handle.deactivate();
            handle.activate();
        }
    }
}

impl Drop for ProcessingState {
    fn drop(&mut self) {
        for handle in &mut self.handles {
            handle.deactivate();
        }
        // `cleanup` runs as each handle drops, before the buffers go.
        self.handles.clear();
    }
}

/// Shut down every instance so it restarts with the new format.
pub(crate) fn start(instances: &mut InstanceManager) {
    for instance in instances.iter_mut() {
        instance.shutdown_processing();
    }
}

/// Run one block through the chain, in list order.
pub(crate) fn process(instances: &mut InstanceManager, format: AudioFormat, data: &mut [f32]) {
    if format.channels == 0 {
        return;
    }

    for instance in instances.iter_mut() {
        instance.process(format, data);
    }
}

pub(crate) fn flush(instances: &mut InstanceManager) {
    for instance in instances.iter_mut() {
        if let Some(state) = instance.processing.as_mut() {
            state.flush();
        }
    }
}
