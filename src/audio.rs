//! Audio capture and processing
//!
//! Everything between the microphone and the wire: the CPAL capture
//! session, the per-block linear resampler, and the FFT snapshots that
//! feed the input meter.
//!
//! The module is organized into:
//! - `capture`: CPAL input stream ownership and block accumulation
//! - `resampler`: block-wise linear interpolation to the wire rate
//! - `spectrum`: byte-range frequency snapshots for the meter

use std::sync::{Arc, Mutex};

mod capture;
mod resampler;
mod spectrum;

pub use capture::{list_devices, AudioCaptureSession, AudioDeviceInfo, CaptureError};
pub use resampler::resample;
pub use spectrum::{SpectrumAnalyzer, SpectrumConfig};

/// Samples per capture block; blocks are resampled and framed whole
pub const BLOCK_SIZE: usize = 4096;

/// Sample rate the recognizer expects on the wire
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Latest meter snapshot, written by the capture callback and read by the
/// meter task on its own cadence
pub type SnapshotSlot = Arc<Mutex<Option<Vec<f32>>>>;

/// Create an empty snapshot slot
pub fn snapshot_slot() -> SnapshotSlot {
    Arc::new(Mutex::new(None))
}
