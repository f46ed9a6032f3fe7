//! Live input meter
//!
//! Samples the latest frequency snapshot on a fixed cadence and renders a
//! row of bars to stderr. The sampler is a periodic task with an explicit
//! stop; it is started when capture begins and cancelled when capture
//! ends, never left to poll a flag on its own.

use std::io::Write;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::audio::SnapshotSlot;

/// Number of bars in the meter
pub const BAR_COUNT: usize = 30;

/// Redraw cadence
pub const TICK: Duration = Duration::from_millis(50);

/// Snapshot bins are 0-255; heights come out of this divisor
const HEIGHT_DIVISOR: f32 = 4.0;

/// Height every bar settles at while capture is inactive
const MIN_BAR_HEIGHT: f32 = 3.0;

const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Map a frequency snapshot onto bar heights: every
/// `floor(len / BAR_COUNT)`-th bin, scaled by the height divisor
pub fn bar_heights(snapshot: &[f32]) -> Vec<f32> {
    if snapshot.is_empty() {
        return idle_heights();
    }

    let step = snapshot.len() / BAR_COUNT;
    (0..BAR_COUNT)
        .map(|i| snapshot[i * step] / HEIGHT_DIVISOR)
        .collect()
}

/// Bar heights for an inactive meter
pub fn idle_heights() -> Vec<f32> {
    vec![MIN_BAR_HEIGHT; BAR_COUNT]
}

/// The periodic meter task
pub struct VisualizerSampler {
    handle: JoinHandle<()>,
}

impl VisualizerSampler {
    /// Start redrawing from `slot` every tick
    pub fn start(slot: SnapshotSlot) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                let heights = match slot.lock() {
                    Ok(latest) => match latest.as_ref() {
                        Some(snapshot) => bar_heights(snapshot),
                        None => idle_heights(),
                    },
                    Err(_) => idle_heights(),
                };
                draw(&heights);
            }
        });

        Self { handle }
    }

    /// Cancel the task and settle the meter at its floor
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
        draw(&idle_heights());
        eprintln!();
    }
}

fn draw(heights: &[f32]) {
    let mut line = String::with_capacity(heights.len() * 3 + 1);
    line.push('\r');
    for &height in heights {
        let level = ((height / 8.0) as usize).min(GLYPHS.len() - 1);
        line.push(GLYPHS[level]);
    }

    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(line.as_bytes());
    let _ = stderr.flush();
}
