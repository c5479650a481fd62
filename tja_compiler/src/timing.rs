use tja_schema::Milliseconds;

use crate::ChartError;

/// Frames per second the scroll rates are normalised to.
pub const REFERENCE_FPS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSignature {
    pub numerator: f64,
    pub denominator: f64,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4.0,
            denominator: 4.0,
        }
    }
}

impl TimeSignature {
    pub fn ratio(&self) -> f64 {
        self.numerator / self.denominator
    }

    /// Quarter-note beats per measure.
    pub fn beats(&self) -> f64 {
        self.ratio() * 4.0
    }
}

pub fn measure_duration_ms(
    bpm: f64,
    signature: TimeSignature,
    line: usize,
) -> Result<Milliseconds, ChartError> {
    if !(bpm > 0.0) || !bpm.is_finite() {
        return Err(ChartError::new(
            "E3001",
            format!("tempo must be > 0 (bpm={bpm})"),
            line,
        ));
    }
    Ok(60_000.0 * signature.beats() / bpm)
}

/// Pixels a note travels per reference frame so that it covers `distance`
/// in one measure's worth of beats at the effective tempo.
pub fn pixels_per_frame(bpm: f64, signature: TimeSignature, scroll: f64, distance: f64) -> f64 {
    let effective_bpm = bpm * signature.ratio() * scroll;
    if effective_bpm == 0.0 {
        return 0.0;
    }
    let beat_duration = 60.0 / effective_bpm;
    let total_frames = REFERENCE_FPS * signature.beats() * beat_duration;
    distance / total_frames
}

pub fn pixels_per_ms(pixels_per_frame: f64) -> f64 {
    pixels_per_frame * REFERENCE_FPS / 1000.0
}

/// First moment a note hitting at `hit_ms` is on screen. A stationary note
/// is visible from the chart start.
pub fn load_time_ms(hit_ms: Milliseconds, pixels_per_frame: f64, distance: f64) -> Milliseconds {
    let speed = pixels_per_ms(pixels_per_frame).abs();
    if speed > f64::EPSILON {
        hit_ms - distance / speed
    } else {
        hit_ms.min(0.0)
    }
}
