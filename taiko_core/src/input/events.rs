use serde::{Deserialize, Serialize};
use tja_schema::{DrumSide, Milliseconds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

/// One of the four drum zones a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumPad {
    LeftDon,
    RightDon,
    LeftKat,
    RightKat,
}

impl DrumPad {
    pub const ALL: [DrumPad; 4] = [
        Self::LeftDon,
        Self::RightDon,
        Self::LeftKat,
        Self::RightKat,
    ];

    pub fn side(self) -> DrumSide {
        match self {
            Self::LeftDon | Self::RightDon => DrumSide::Don,
            Self::LeftKat | Self::RightKat => DrumSide::Kat,
        }
    }

    pub fn hand(self) -> Hand {
        match self {
            Self::LeftDon | Self::LeftKat => Hand::Left,
            Self::RightDon | Self::RightKat => Hand::Right,
        }
    }

    pub fn hit(self, timestamp: Milliseconds) -> DrumHit {
        DrumHit {
            side: self.side(),
            hand: self.hand(),
            timestamp,
        }
    }
}

/// A drum strike, timestamped once at capture in chart milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrumHit {
    pub side: DrumSide,
    pub hand: Hand,
    pub timestamp: Milliseconds,
}

impl DrumHit {
    pub fn don(timestamp: Milliseconds) -> Self {
        DrumPad::LeftDon.hit(timestamp)
    }

    pub fn kat(timestamp: Milliseconds) -> Self {
        DrumPad::LeftKat.hit(timestamp)
    }
}
