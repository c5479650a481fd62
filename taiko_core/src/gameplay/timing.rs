use serde::{Deserialize, Serialize};

/// Half-widths of the judgment windows, in milliseconds.
pub const GOOD_WINDOW_MS: f64 = 25.025;
pub const OK_WINDOW_MS: f64 = 75.075;
pub const BAD_WINDOW_MS: f64 = 108.4417;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    Good,
    Ok,
    Bad,
    /// Never hit; scored like Bad.
    Miss,
}

impl Judgment {
    pub fn breaks_combo(self) -> bool {
        matches!(self, Self::Bad | Self::Miss)
    }
}

/// Innermost window containing `offset_ms` (input time minus hit time).
/// Window edges are inclusive. `None` outside the Bad window.
pub fn classify(offset_ms: f64) -> Option<Judgment> {
    let distance = offset_ms.abs();
    if distance <= GOOD_WINDOW_MS {
        Some(Judgment::Good)
    } else if distance <= OK_WINDOW_MS {
        Some(Judgment::Ok)
    } else if distance <= BAD_WINDOW_MS {
        Some(Judgment::Bad)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_edges_are_inclusive() {
        assert_eq!(classify(0.0), Some(Judgment::Good));
        assert_eq!(classify(GOOD_WINDOW_MS), Some(Judgment::Good));
        assert_eq!(classify(-GOOD_WINDOW_MS), Some(Judgment::Good));
        assert_eq!(classify(GOOD_WINDOW_MS + 0.001), Some(Judgment::Ok));
        assert_eq!(classify(-OK_WINDOW_MS), Some(Judgment::Ok));
        assert_eq!(classify(OK_WINDOW_MS + 0.001), Some(Judgment::Bad));
        assert_eq!(classify(BAD_WINDOW_MS), Some(Judgment::Bad));
        assert_eq!(classify(BAD_WINDOW_MS + 1e-9), None);
        assert_eq!(classify(-BAD_WINDOW_MS - 1e-9), None);
    }
}
