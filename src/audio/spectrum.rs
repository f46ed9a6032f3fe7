//! Frequency snapshots for the live input meter
//!
//! Small FFT over the most recent capture samples, published as byte-range
//! (0-255) magnitude bins. The meter samples these on its own cadence, so
//! the analyzer only ever keeps the latest window.

use rustfft::{num_complex::Complex, FftPlanner};

/// Configuration for snapshot analysis
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    /// FFT window size; snapshots carry `fft_size / 2` bins
    pub fft_size: usize,
    /// Temporal smoothing factor (0.0-1.0, higher = more smoothing)
    pub smoothing_factor: f32,
    /// Magnitude mapped to byte 0 at this level (dBFS)
    pub min_db: f32,
    /// Magnitude mapped to byte 255 at this level (dBFS)
    pub max_db: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_factor: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

/// FFT-based analyzer producing byte-range frequency snapshots
pub struct SpectrumAnalyzer {
    config: SpectrumConfig,
    sample_buffer: Vec<f32>,
    fft_planner: FftPlanner<f32>,
    window: Vec<f32>,
    prev_magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self::with_config(SpectrumConfig::default())
    }

    pub fn with_config(config: SpectrumConfig) -> Self {
        // Hann window to reduce spectral leakage
        let mut window = vec![0.0; config.fft_size];
        for (i, w) in window.iter_mut().enumerate() {
            *w = 0.5
                * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / config.fft_size as f32).cos());
        }

        Self {
            sample_buffer: Vec::with_capacity(config.fft_size),
            prev_magnitudes: vec![0.0; config.fft_size / 2],
            window,
            fft_planner: FftPlanner::new(),
            config,
        }
    }

    /// Number of bins per snapshot
    pub fn snapshot_len(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Push a single audio sample and optionally return a snapshot
    ///
    /// Returns `Some(bins)` when the FFT window is full and ready to
    /// process, `None` while more samples are needed. Bin values are in
    /// 0.0-255.0.
    pub fn push_sample(&mut self, sample: f32) -> Option<Vec<f32>> {
        self.sample_buffer.push(sample);

        if self.sample_buffer.len() >= self.config.fft_size {
            let snapshot = self.compute_snapshot();
            self.sample_buffer.clear();
            Some(snapshot)
        } else {
            None
        }
    }

    fn compute_snapshot(&mut self) -> Vec<f32> {
        let mut windowed: Vec<Complex<f32>> = self
            .sample_buffer
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        let fft = self.fft_planner.plan_fft_forward(self.config.fft_size);
        fft.process(&mut windowed);

        // Normalize so a full-scale sine lands near 0 dBFS under the Hann
        // window's 0.5 coherent gain.
        let scale = 4.0 / self.config.fft_size as f32;
        let db_span = self.config.max_db - self.config.min_db;

        let mut snapshot = Vec::with_capacity(self.snapshot_len());
        for (i, bin) in windowed.iter().take(self.snapshot_len()).enumerate() {
            // Smoothing happens in the linear domain, before dB conversion.
            let magnitude = self.config.smoothing_factor * self.prev_magnitudes[i]
                + (1.0 - self.config.smoothing_factor) * bin.norm() * scale;
            self.prev_magnitudes[i] = magnitude;

            let db = 20.0 * magnitude.max(1e-10).log10();
            let byte = (db - self.config.min_db) / db_span * 255.0;
            snapshot.push(byte.clamp(0.0, 255.0));
        }

        snapshot
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_sample_returns_none_until_window_full() {
        let mut analyzer = SpectrumAnalyzer::new();

        for _ in 0..255 {
            assert!(analyzer.push_sample(0.0).is_none());
        }

        assert!(analyzer.push_sample(0.0).is_some());
    }

    #[test]
    fn test_snapshot_has_half_window_bins() {
        let mut analyzer = SpectrumAnalyzer::new();

        let mut snapshot = None;
        for _ in 0..256 {
            snapshot = analyzer.push_sample(0.1);
        }

        assert_eq!(snapshot.map(|s| s.len()), Some(128));
    }

    #[test]
    fn test_silence_produces_floor_values() {
        let mut analyzer = SpectrumAnalyzer::new();

        let mut snapshot = None;
        for _ in 0..256 {
            snapshot = analyzer.push_sample(0.0);
        }

        for bin in snapshot.into_iter().flatten() {
            assert!(bin < 1.0, "expected near-zero bin for silence, got {bin}");
        }
    }

    #[test]
    fn test_loud_tone_registers_in_snapshot() {
        let mut analyzer = SpectrumAnalyzer::with_config(SpectrumConfig {
            smoothing_factor: 0.0,
            ..SpectrumConfig::default()
        });

        // Full-scale tone a few bins up at a 48kHz capture rate.
        let mut snapshot = None;
        for i in 0..256 {
            let t = i as f32 / 48000.0;
            snapshot = analyzer.push_sample((2.0 * std::f32::consts::PI * 1500.0 * t).sin());
        }

        let peak = snapshot
            .expect("window should be full")
            .into_iter()
            .fold(0.0f32, f32::max);
        assert!(peak > 200.0, "expected a strong peak bin, got {peak}");
    }
}
