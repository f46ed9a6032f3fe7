//! Microphone capture session
//!
//! Wraps a CPAL input stream for the duration of one streaming session.
//! The data callback downmixes to the first channel, feeds the meter's
//! spectrum analyzer, accumulates fixed-size blocks and hands each block
//! off resampled to 16kHz. Blocks produced while the connection is not
//! open are dropped rather than buffered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use super::resampler::resample;
use super::spectrum::SpectrumAnalyzer;
use super::{SnapshotSlot, BLOCK_SIZE, TARGET_SAMPLE_RATE};

/// Any failure to acquire or run the input device. Hardware absence and
/// permission denial are deliberately not distinguished.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Information about an available audio input device
#[derive(Debug)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Accumulates samples into fixed-size capture blocks
struct BlockChunker {
    buf: Vec<f32>,
}

impl BlockChunker {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(BLOCK_SIZE),
        }
    }

    fn push(&mut self, sample: f32) -> Option<Vec<f32>> {
        self.buf.push(sample);
        if self.buf.len() >= BLOCK_SIZE {
            Some(std::mem::replace(
                &mut self.buf,
                Vec::with_capacity(BLOCK_SIZE),
            ))
        } else {
            None
        }
    }
}

/// An active microphone capture owned by one streaming session
pub struct AudioCaptureSession {
    stream: Option<cpal::Stream>,
    sample_rate: u32,
}

impl AudioCaptureSession {
    /// Open the default input device and start capturing.
    ///
    /// Resampled blocks are sent through `block_tx` only while
    /// `connection_open` is set. Raw samples also feed `snapshot_slot`
    /// for the meter. On any error nothing is left attached.
    pub fn start(
        block_tx: UnboundedSender<Vec<f32>>,
        connection_open: Arc<AtomicBool>,
        snapshot_slot: SnapshotSlot,
    ) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no input device found".into()))?;

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                sample_rate,
                block_tx,
                connection_open,
                snapshot_slot,
            )?,
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                sample_rate,
                block_tx,
                connection_open,
                snapshot_slot,
            )?,
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                sample_rate,
                block_tx,
                connection_open,
                snapshot_slot,
            )?,
            other => {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "unsupported sample format: {other}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        Ok(Self {
            stream: Some(stream),
            sample_rate,
        })
    }

    /// Native rate of the capture device
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stop capturing and release the device. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        sample_rate: u32,
        block_tx: UnboundedSender<Vec<f32>>,
        connection_open: Arc<AtomicBool>,
        snapshot_slot: SnapshotSlot,
    ) -> Result<cpal::Stream, CaptureError>
    where
        T: cpal::Sample + cpal::SizedSample + Send + 'static,
        f32: cpal::FromSample<T>,
    {
        let mut chunker = BlockChunker::new();
        let mut analyzer = SpectrumAnalyzer::new();

        let stream = device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    for frame in data.chunks(channels.max(1)) {
                        // First channel only; the wire format is mono.
                        let sample: f32 = cpal::Sample::from_sample(frame[0]);

                        if let Some(snapshot) = analyzer.push_sample(sample) {
                            if let Ok(mut slot) = snapshot_slot.lock() {
                                *slot = Some(snapshot);
                            }
                        }

                        if let Some(block) = chunker.push(sample) {
                            if connection_open.load(Ordering::Acquire) {
                                let resampled =
                                    resample(&block, sample_rate, TARGET_SAMPLE_RATE);
                                let _ = block_tx.send(resampled);
                            }
                        }
                    }
                },
                |err| {
                    eprintln!("audio stream error: {err}");
                },
                None,
            )
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        Ok(stream)
    }
}

impl Drop for AudioCaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// List all available audio input devices
pub fn list_devices() -> Result<Vec<AudioDeviceInfo>> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    let mut infos = Vec::new();
    for device in host.input_devices()? {
        let name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());
        let config = device.default_input_config()?;
        infos.push(AudioDeviceInfo {
            is_default: name == default_name,
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            name,
        });
    }

    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunker_emits_fixed_blocks() {
        let mut chunker = BlockChunker::new();

        for _ in 0..BLOCK_SIZE - 1 {
            assert!(chunker.push(0.0).is_none());
        }

        let block = chunker.push(0.0).expect("block should be full");
        assert_eq!(block.len(), BLOCK_SIZE);
    }

    #[test]
    fn test_chunker_starts_fresh_after_emitting() {
        let mut chunker = BlockChunker::new();

        for _ in 0..BLOCK_SIZE {
            let _ = chunker.push(0.5);
        }

        assert!(chunker.push(0.1).is_none());
        assert_eq!(chunker.buf.len(), 1);
    }
}
