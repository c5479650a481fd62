use atomic_float::AtomicF64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tja_schema::Milliseconds;

/// Chart clock driven by the audio thread's playback position.
///
/// The audio thread stores its position (ms since audio start) into the
/// shared atomic; between updates the conductor extrapolates with the
/// system clock so the judgment loop sees a smooth, monotonic time.
pub struct Conductor {
    audio_time_source: Arc<AtomicF64>,
    offset_ms: Milliseconds,
    last_audio_ms: Milliseconds,
    last_update_ms: Milliseconds,
}

impl Conductor {
    /// `offset_ms` is the chart's OFFSET: chart time = audio time + offset.
    pub fn new(audio_time_source: Arc<AtomicF64>, offset_ms: Milliseconds) -> Self {
        Self {
            audio_time_source,
            offset_ms,
            last_audio_ms: 0.0,
            last_update_ms: 0.0,
        }
    }

    /// Samples the audio position. Call once per frame.
    pub fn update(&mut self, system_ms: Milliseconds) {
        self.last_audio_ms = self.audio_time_source.load(Ordering::Acquire);
        self.last_update_ms = system_ms;
    }

    pub fn audio_ms(&self, system_ms: Milliseconds) -> Milliseconds {
        self.last_audio_ms + (system_ms - self.last_update_ms)
    }

    pub fn chart_ms(&self, system_ms: Milliseconds) -> Milliseconds {
        self.audio_ms(system_ms) + self.offset_ms
    }

    pub fn offset_ms(&self) -> Milliseconds {
        self.offset_ms
    }
}
