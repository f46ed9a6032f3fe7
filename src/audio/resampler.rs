//! Linear-interpolation resampling to the wire sample rate
//!
//! The recognizer expects 16kHz mono regardless of what the capture device
//! delivers, so every block is converted before transmission. Each block is
//! resampled independently; continuity across block boundaries is
//! approximate, which keeps the hot path stateless and allocation-light.

/// Resample a block of mono samples from `rate_in` to `rate_out`.
///
/// Output length is `floor(len * rate_out / rate_in)`. Each output sample
/// maps back to a fractional source position and linearly interpolates
/// between its two neighbors, with the upper neighbor clamped to the last
/// input sample so the tail never reads out of range.
pub fn resample(input: &[f32], rate_in: u32, rate_out: u32) -> Vec<f32> {
    if input.is_empty() || rate_in == 0 || rate_out == 0 {
        return Vec::new();
    }

    let ratio = rate_out as f64 / rate_in as f64;
    let out_len = (input.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 / ratio;
        let idx = pos as usize;
        let next = (idx + 1).min(input.len() - 1);
        let frac = (pos - idx as f64) as f32;
        output.push(input[idx] * (1.0 - frac) + input[next] * frac);
    }

    output
}
