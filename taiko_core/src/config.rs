use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tja_schema::Milliseconds;

use crate::gameplay::gauge::GaugeTable;
use crate::input::events::DrumPad;
use crate::position::Layout;

/// Player-side settings. Every field has a default, so a partial JSON file
/// is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Subtracted from input and frame times before judging.
    pub judge_offset_ms: Milliseconds,
    pub key_bindings: KeyBindings,
    pub layout: Layout,
    pub gauge: GaugeTable,
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse config JSON")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub left_don: Vec<String>,
    pub right_don: Vec<String>,
    pub left_kat: Vec<String>,
    pub right_kat: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left_don: vec!["F".to_string()],
            right_don: vec!["J".to_string()],
            left_kat: vec!["D".to_string()],
            right_kat: vec!["K".to_string()],
        }
    }
}

impl KeyBindings {
    pub fn keys(&self, pad: DrumPad) -> &[String] {
        match pad {
            DrumPad::LeftDon => &self.left_don,
            DrumPad::RightDon => &self.right_don,
            DrumPad::LeftKat => &self.left_kat,
            DrumPad::RightKat => &self.right_kat,
        }
    }

    /// Key names compare case-insensitively. The first matching pad in
    /// `DrumPad::ALL` order wins.
    pub fn pad_for_key(&self, key: &str) -> Option<DrumPad> {
        DrumPad::ALL
            .into_iter()
            .find(|&pad| self.keys(pad).iter().any(|k| k.eq_ignore_ascii_case(key)))
    }
}
