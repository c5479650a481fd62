use serde::{Deserialize, Serialize};
use tja_schema::Difficulty;

use crate::error::SessionError;

/// Upper bound of the gauge; the display scale runs to 100 but play stops
/// accumulating here.
pub const GAUGE_MAX: f64 = 87.0;
pub const MAX_LEVEL: u32 = 10;

/// Gauge response of one difficulty tier at one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeEntry {
    /// Share of Goods (in percent) that fills the gauge to the clear line.
    pub clear_rate: f64,
    pub ok_multiplier: f64,
    /// Negative.
    pub bad_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeTier {
    pub clear_threshold: f64,
    /// Indexed by level, `0..=MAX_LEVEL`. `None` marks an unsupported level.
    pub levels: Vec<Option<GaugeEntry>>,
}

impl GaugeTier {
    fn uniform(clear_rates: &[(u32, f64)], ok_multiplier: f64, bad: impl Fn(u32) -> f64) -> Self {
        let mut levels = vec![None; MAX_LEVEL as usize + 1];
        for &(level, clear_rate) in clear_rates {
            levels[level as usize] = Some(GaugeEntry {
                clear_rate,
                ok_multiplier,
                bad_multiplier: bad(level),
            });
        }
        Self {
            clear_threshold: 68.0,
            levels,
        }
    }
}

/// Rows are difficulty tiers: easy, normal, hard, oni/edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeTable {
    pub tiers: Vec<GaugeTier>,
}

/// Placeholder calibration: clear rates and multipliers are estimates, meant
/// to be overridden from `GameConfig`. The 68 clear threshold is fixed.
impl Default for GaugeTable {
    fn default() -> Self {
        let easy = GaugeTier::uniform(
            &[(1, 36.0), (2, 38.0), (3, 38.0), (4, 44.0), (5, 44.0)],
            0.75,
            |_| -0.5,
        );
        let normal = GaugeTier::uniform(
            &[
                (1, 45.0),
                (2, 45.0),
                (3, 48.0),
                (4, 48.0),
                (5, 52.0),
                (6, 52.0),
                (7, 55.0),
            ],
            0.75,
            |level| if level <= 3 { -0.5 } else { -0.75 },
        );
        let hard = GaugeTier::uniform(
            &[
                (1, 55.0),
                (2, 55.0),
                (3, 58.0),
                (4, 58.0),
                (5, 60.0),
                (6, 60.0),
                (7, 62.0),
                (8, 62.0),
            ],
            0.75,
            |level| if level <= 2 { -0.75 } else if level <= 5 { -1.0 } else { -1.25 },
        );
        let oni = GaugeTier::uniform(
            &[
                (1, 62.0),
                (2, 62.0),
                (3, 64.0),
                (4, 64.0),
                (5, 66.0),
                (6, 66.0),
                (7, 68.0),
                (8, 70.0),
                (9, 72.0),
                (10, 75.0),
            ],
            0.5,
            |level| if level <= 7 { -1.6 } else { -2.0 },
        );
        Self {
            tiers: vec![easy, normal, hard, oni],
        }
    }
}

impl GaugeTable {
    /// Levels above `MAX_LEVEL` use the top row; a missing row is an error,
    /// never a neighbour's.
    pub fn lookup(
        &self,
        difficulty: Difficulty,
        level: u32,
    ) -> Result<(f64, GaugeEntry), SessionError> {
        let unsupported = || SessionError::UnsupportedDifficultyLevel { difficulty, level };
        let tier = difficulty
            .gauge_tier()
            .and_then(|t| self.tiers.get(t))
            .ok_or_else(unsupported)?;
        let entry = tier
            .levels
            .get(level.min(MAX_LEVEL) as usize)
            .copied()
            .flatten()
            .ok_or_else(unsupported)?;
        Ok((tier.clear_threshold, entry))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    length: f64,
    previous_length: f64,
    total_notes: usize,
    clear_threshold: f64,
    entry: GaugeEntry,
}

impl Gauge {
    pub fn new(
        table: &GaugeTable,
        difficulty: Difficulty,
        level: u32,
        total_notes: usize,
    ) -> Result<Self, SessionError> {
        let (clear_threshold, entry) = table.lookup(difficulty, level)?;
        Ok(Self::with_entry(entry, clear_threshold, total_notes))
    }

    pub fn with_entry(entry: GaugeEntry, clear_threshold: f64, total_notes: usize) -> Self {
        Self {
            length: 0.0,
            previous_length: 0.0,
            total_notes,
            clear_threshold,
            entry,
        }
    }

    /// Unclamped change for one judgment with the given multiplier.
    pub fn delta(&self, multiplier: f64) -> f64 {
        if self.total_notes == 0 || self.entry.clear_rate <= 0.0 {
            return 0.0;
        }
        (1.0 / self.total_notes as f64)
            * 100.0
            * (self.clear_threshold / self.entry.clear_rate)
            * multiplier
    }

    pub fn add_good(&mut self) {
        self.apply(1.0);
    }

    pub fn add_ok(&mut self) {
        self.apply(self.entry.ok_multiplier);
    }

    /// Also used for misses.
    pub fn add_bad(&mut self) {
        self.apply(self.entry.bad_multiplier);
    }

    fn apply(&mut self, multiplier: f64) {
        self.previous_length = self.length;
        self.length = (self.length + self.delta(multiplier)).clamp(0.0, GAUGE_MAX);
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn previous_length(&self) -> f64 {
        self.previous_length
    }

    pub fn clear_threshold(&self) -> f64 {
        self.clear_threshold
    }

    pub fn is_cleared(&self) -> bool {
        self.length >= self.clear_threshold
    }
}
