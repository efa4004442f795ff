//! State shared between the audio thread and the main thread.
//!
//! Everything is stored in atomics. Floats are bit-cast to `u32`,
//! so neither side ever blocks the other.

use crate::params::ParamId;
use serde::Serialize;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

struct SharedData {
    /// Parameter values, indexed by [ParamId].
    values: [AtomicU32; ParamId::ALL.len()],
    rms_left: AtomicU32,
    rms_right: AtomicU32,
    /// Number of audio blocks processed since activation.
    block_counter: AtomicU64,
    /// Set when the editor changed a parameter the host doesn't know about yet.
    edited: AtomicBool,
    /// Set with `edited`, cleared once the host was asked for a flush.
    flush_requested: AtomicBool,
}

/// Shared state accessible from all plugin threads.
///
/// Cheap to clone, so the editor's `'static` IPC handler can hold one.
#[derive(Clone)]
pub struct VelocityRemapShared {
    inner: Arc<SharedData>,
}

impl VelocityRemapShared {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SharedData {
                values: ParamId::ALL
                    .map(|param| AtomicU32::new(param.descriptor().default.to_bits())),
                rms_left: AtomicU32::new(0.0f32.to_bits()),
                rms_right: AtomicU32::new(0.0f32.to_bits()),
                block_counter: AtomicU64::new(0),
                edited: AtomicBool::new(false),
                flush_requested: AtomicBool::new(false),
            }),
        }
    }

    pub fn get(&self, param: ParamId) -> f32 {
        f32::from_bits(self.inner.values[param as usize].load(Ordering::Acquire))
    }

    /// Stores a parameter value, clamped to its range.
    pub fn set(&self, param: ParamId, value: f32) {
        let value = param.descriptor().clamp(value);
        self.inner.values[param as usize].store(value.to_bits(), Ordering::Release);
    }

    pub fn note_on_velocity(&self) -> f32 {
        self.get(ParamId::NoteOnVelocity)
    }

    pub fn bypass(&self) -> f32 {
        self.get(ParamId::Bypass)
    }

    pub fn set_levels(&self, left: f32, right: f32) {
        self.inner.rms_left.store(left.to_bits(), Ordering::Relaxed);
        self.inner.rms_right.store(right.to_bits(), Ordering::Relaxed);
    }

    pub fn levels(&self) -> (f32, f32) {
        (
            f32::from_bits(self.inner.rms_left.load(Ordering::Relaxed)),
            f32::from_bits(self.inner.rms_right.load(Ordering::Relaxed)),
        )
    }

    /// Increments the block counter, returning the new count.
    pub fn count_block(&self) -> u64 {
        self.inner.block_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn block_count(&self) -> u64 {
        self.inner.block_counter.load(Ordering::Relaxed)
    }

    pub fn reset_block_count(&self) {
        self.inner.block_counter.store(0, Ordering::Relaxed);
    }

    /// Stores a value coming from the editor and flags it for the host.
    pub fn set_from_editor(&self, param: ParamId, value: f32) {
        self.set(param, value);
        self.mark_edited();
        self.inner.flush_requested.store(true, Ordering::Release);
    }

    /// Flags the current values as not yet reported to the host.
    pub fn mark_edited(&self) {
        self.inner.edited.store(true, Ordering::Release);
    }

    /// Returns whether the editor changed anything since the last call.
    pub fn take_edited(&self) -> bool {
        self.inner.edited.swap(false, Ordering::AcqRel)
    }

    /// Returns whether the host should be asked to flush parameters,
    /// once per batch of editor changes.
    pub fn take_flush_request(&self) -> bool {
        self.inner.flush_requested.swap(false, Ordering::AcqRel)
    }

    /// Takes a consistent-enough copy of everything the editor shows.
    pub fn readout(&self) -> Readout {
        let note_on_velocity = self.note_on_velocity();
        let bypass = self.bypass();
        let (rms_left, rms_right) = self.levels();

        let mut debug = DebugLines::new();
        debug.update(note_on_velocity, bypass);

        Readout {
            note_on_velocity,
            bypass,
            rms_left,
            rms_right,
            block_count: self.block_count(),
            velocity_line: debug.velocity,
            bypass_line: debug.bypass,
        }
    }
}

impl Default for VelocityRemapShared {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> clack_plugin::prelude::PluginShared<'a> for VelocityRemapShared {}

/// A snapshot of the shared state, as sent to the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub note_on_velocity: f32,
    pub bypass: f32,
    pub rms_left: f32,
    pub rms_right: f32,
    pub block_count: u64,
    pub velocity_line: String,
    pub bypass_line: String,
}

/// The two debug strings describing the current parameters.
///
/// Buffers are reserved up front and reused,
/// so updating them on the audio thread does not allocate.
#[derive(Debug)]
pub struct DebugLines {
    pub velocity: String,
    pub bypass: String,
}

impl DebugLines {
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self {
            velocity: String::with_capacity(Self::CAPACITY),
            bypass: String::with_capacity(Self::CAPACITY),
        }
    }

    pub fn update(&mut self, note_on_velocity: f32, bypass: f32) {
        self.velocity.clear();
        self.bypass.clear();
        // writing into a String never fails
        let _ = write!(self.velocity, "noteOnVel: {note_on_velocity:.6}");
        let _ = write!(self.bypass, "Bypass: {bypass:.6}");
    }
}

impl Default for DebugLines {
    fn default() -> Self {
        Self::new()
    }
}
