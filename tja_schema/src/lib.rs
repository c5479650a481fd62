use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

pub type Milliseconds = f64;

/// The two playable faces of the drum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumSide {
    Don,
    Kat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    Don,
    Kat,
    BigDon,
    BigKat,
    DrumrollHead,
    BigDrumrollHead,
    BalloonHead,
    KusudamaHead,
    TailMarker,
    Barline,
}

impl NoteType {
    /// Decodes a chart glyph. `'0'` (rest) and anything outside `'1'..='9'`
    /// yield `None`.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '1' => Some(Self::Don),
            '2' => Some(Self::Kat),
            '3' => Some(Self::BigDon),
            '4' => Some(Self::BigKat),
            '5' => Some(Self::DrumrollHead),
            '6' => Some(Self::BigDrumrollHead),
            '7' => Some(Self::BalloonHead),
            '8' => Some(Self::TailMarker),
            '9' => Some(Self::KusudamaHead),
            _ => None,
        }
    }

    pub fn glyph(self) -> Option<char> {
        match self {
            Self::Don => Some('1'),
            Self::Kat => Some('2'),
            Self::BigDon => Some('3'),
            Self::BigKat => Some('4'),
            Self::DrumrollHead => Some('5'),
            Self::BigDrumrollHead => Some('6'),
            Self::BalloonHead => Some('7'),
            Self::TailMarker => Some('8'),
            Self::KusudamaHead => Some('9'),
            Self::Barline => None,
        }
    }

    /// Don, Kat and their big variants: the notes judged by timing window.
    pub fn is_single(self) -> bool {
        matches!(self, Self::Don | Self::Kat | Self::BigDon | Self::BigKat)
    }

    pub fn is_big(self) -> bool {
        matches!(self, Self::BigDon | Self::BigKat | Self::BigDrumrollHead)
    }

    pub fn side(self) -> Option<DrumSide> {
        match self {
            Self::Don | Self::BigDon => Some(DrumSide::Don),
            Self::Kat | Self::BigKat => Some(DrumSide::Kat),
            _ => None,
        }
    }

    pub fn opens_span(self) -> bool {
        self.is_drumroll() || self.is_balloon()
    }

    pub fn is_drumroll(self) -> bool {
        matches!(self, Self::DrumrollHead | Self::BigDrumrollHead)
    }

    /// Balloon or kusudama head.
    pub fn is_balloon(self) -> bool {
        matches!(self, Self::BalloonHead | Self::KusudamaHead)
    }

    /// Swaps the drum face, keeping size. Span notes are unaffected.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Don => Self::Kat,
            Self::Kat => Self::Don,
            Self::BigDon => Self::BigKat,
            Self::BigKat => Self::BigDon,
            other => other,
        }
    }
}

/// Sound-effect lettering shown under a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Moji {
    Blank,
    Don,
    /// Don followed closely by another don.
    Do,
    /// Middle of an isolated don triplet.
    Ko,
    Katsu,
    /// Kat followed closely by another kat.
    Ka,
    DaiDon,
    DaiKatsu,
    Renda,
    DaiRenda,
    Fusen,
    SpanEnd,
    Kusudama,
}

impl Moji {
    pub fn base(note_type: NoteType) -> Self {
        match note_type {
            NoteType::Don => Self::Don,
            NoteType::Kat => Self::Katsu,
            NoteType::BigDon => Self::DaiDon,
            NoteType::BigKat => Self::DaiKatsu,
            NoteType::DrumrollHead => Self::Renda,
            NoteType::BigDrumrollHead => Self::DaiRenda,
            NoteType::BalloonHead => Self::Fusen,
            NoteType::TailMarker => Self::SpanEnd,
            NoteType::KusudamaHead => Self::Kusudama,
            NoteType::Barline => Self::Blank,
        }
    }

    /// Index into the skin's lettering sheet.
    pub fn texture_index(self) -> Option<u8> {
        match self {
            Self::Blank => None,
            Self::Don => Some(0),
            Self::Do => Some(1),
            Self::Ko => Some(2),
            Self::Katsu => Some(3),
            Self::Ka => Some(4),
            Self::DaiDon => Some(5),
            Self::DaiKatsu => Some(6),
            Self::Renda => Some(7),
            Self::Fusen => Some(9),
            Self::SpanEnd => Some(10),
            Self::Kusudama => Some(11),
            Self::DaiRenda => Some(14),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanKind {
    Drumroll { big: bool },
    Balloon { required_hits: u32, is_kusudama: bool },
}

/// Carried by drumroll/balloon heads; links the head to its tail marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub tail_index: usize,
    pub end_ms: Milliseconds,
    #[serde(flatten)]
    pub kind: SpanKind,
}

impl Span {
    pub fn duration_ms(&self, head_ms: Milliseconds) -> Milliseconds {
        self.end_ms - head_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub hit_ms: Milliseconds,
    pub load_ms: Milliseconds,
    pub ppf_x: f64,
    pub ppf_y: f64,
    pub index: usize,
    pub measure: usize,
    /// Length of the measure the note was placed in, at placement time.
    pub measure_ms: Milliseconds,
    pub bpm: f64,
    pub gogo_time: bool,
    pub moji: Moji,
    pub color: u8,
    #[serde(default)]
    pub popped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Set on tail markers: index of the head they close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_index: Option<usize>,
}

impl Note {
    pub fn is_big(&self) -> bool {
        self.note_type.is_big()
    }

    pub fn required_hits(&self) -> Option<u32> {
        match self.span.map(|s| s.kind) {
            Some(SpanKind::Balloon { required_hits, .. }) => Some(required_hits),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub hit_ms: Milliseconds,
    pub load_ms: Milliseconds,
    pub ppf_x: f64,
    pub ppf_y: f64,
    pub bpm: f64,
    pub display: bool,
    pub measure: usize,
}

/// The three ordered sequences consumed by a play session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteStreams {
    /// Ascending `hit_ms` (ties by `index`).
    pub play_notes: VecDeque<Note>,
    /// Ascending `load_ms`; span tails follow their head.
    pub draw_notes: VecDeque<Note>,
    /// Ascending `load_ms`.
    pub bars: VecDeque<Bar>,
}

impl NoteStreams {
    pub fn single_note_count(&self) -> usize {
        self.play_notes
            .iter()
            .filter(|n| n.note_type.is_single())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.play_notes.is_empty() && self.bars.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Oni,
    Edit,
    Tower,
    Dan,
}

impl Difficulty {
    pub const ALL: [Difficulty; 7] = [
        Self::Easy,
        Self::Normal,
        Self::Hard,
        Self::Oni,
        Self::Edit,
        Self::Tower,
        Self::Dan,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Oni => "oni",
            Self::Edit => "edit",
            Self::Tower => "tower",
            Self::Dan => "dan",
        }
    }

    /// Row of the gauge table. Tower and dan courses have none.
    pub fn gauge_tier(self) -> Option<usize> {
        match self {
            Self::Easy => Some(0),
            Self::Normal => Some(1),
            Self::Hard => Some(2),
            Self::Oni | Self::Edit => Some(3),
            Self::Tower | Self::Dan => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if let Ok(n) = value.parse::<u8>() {
            return Self::from_index(n).ok_or(UnknownDifficulty(value));
        }
        match value.as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            "oni" => Ok(Self::Oni),
            "edit" | "ura" => Ok(Self::Edit),
            "tower" => Ok(Self::Tower),
            "dan" => Ok(Self::Dan),
            _ => Err(UnknownDifficulty(value)),
        }
    }
}

/// Text with optional per-language overrides (`TITLEJA`, `TITLEEN`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub default: String,
    #[serde(default)]
    pub by_language: BTreeMap<String, String>,
}

impl LocalizedText {
    pub fn get(&self, language: &str) -> &str {
        self.by_language
            .get(language)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseData {
    pub level: u32,
    /// `None` when the course never declared `BALLOON:`.
    pub balloon_counts: Option<Vec<u32>>,
    pub score_init: Option<Vec<u32>>,
    pub score_diff: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub title: LocalizedText,
    pub subtitle: LocalizedText,
    pub bpm: f64,
    pub offset_ms: Milliseconds,
    pub wave: Option<String>,
    pub demo_start_ms: Milliseconds,
    pub bg_movie: Option<String>,
    pub scene_preset: Option<String>,
    pub courses: BTreeMap<Difficulty, CourseData>,
}

impl Default for ChartMetadata {
    fn default() -> Self {
        Self {
            title: LocalizedText::default(),
            subtitle: LocalizedText::default(),
            bpm: 120.0,
            offset_ms: 0.0,
            wave: None,
            demo_start_ms: 0.0,
            bg_movie: None,
            scene_preset: None,
            courses: BTreeMap::new(),
        }
    }
}

/// One difficulty of one chart, ready to play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCourse {
    pub meta: ChartMetadata,
    pub difficulty: Difficulty,
    pub level: u32,
    pub base_score: u32,
    pub chart_id: String,
    pub streams: NoteStreams,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn don(index: usize) -> Note {
        Note {
            note_type: NoteType::Don,
            hit_ms: 0.0,
            load_ms: -1000.0,
            ppf_x: 7.0,
            ppf_y: 0.0,
            index,
            measure: 0,
            measure_ms: 2000.0,
            bpm: 120.0,
            gogo_time: false,
            moji: Moji::Don,
            color: 0,
            popped: false,
            span: None,
            head_index: None,
        }
    }

    #[test]
    fn glyphs_decode_to_closed_note_types() {
        assert_eq!(NoteType::from_glyph('0'), None);
        assert_eq!(NoteType::from_glyph('1'), Some(NoteType::Don));
        assert_eq!(NoteType::from_glyph('8'), Some(NoteType::TailMarker));
        assert_eq!(NoteType::from_glyph('9'), Some(NoteType::KusudamaHead));
        assert_eq!(NoteType::from_glyph('A'), None);
        for c in '1'..='9' {
            let t = NoteType::from_glyph(c).unwrap();
            assert_eq!(t.glyph(), Some(c));
        }
    }

    #[test]
    fn mirror_swaps_faces_only() {
        assert_eq!(NoteType::Don.mirrored(), NoteType::Kat);
        assert_eq!(NoteType::BigKat.mirrored(), NoteType::BigDon);
        assert_eq!(NoteType::DrumrollHead.mirrored(), NoteType::DrumrollHead);
        assert_eq!(NoteType::BigDon.side(), Some(DrumSide::Don));
        assert_eq!(NoteType::BalloonHead.side(), None);
    }

    #[test]
    fn unknown_difficulty_is_a_boxable_error() {
        let err = "Extreme".parse::<Difficulty>().unwrap_err();
        assert_eq!(err.to_string(), "unknown difficulty: extreme");
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn difficulty_parses_numbers_and_names() {
        assert_eq!("3".parse::<Difficulty>().unwrap(), Difficulty::Oni);
        assert_eq!("Oni".parse::<Difficulty>().unwrap(), Difficulty::Oni);
        assert_eq!("ura".parse::<Difficulty>().unwrap(), Difficulty::Edit);
        assert!("7".parse::<Difficulty>().is_err());
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Dan.gauge_tier(), None);
        assert_eq!(Difficulty::Edit.gauge_tier(), Some(3));
    }

    #[test]
    fn note_serialization_uses_type_field_and_flattens_span() {
        let mut head = don(0);
        head.note_type = NoteType::BalloonHead;
        head.span = Some(Span {
            tail_index: 1,
            end_ms: 500.0,
            kind: SpanKind::Balloon {
                required_hits: 5,
                is_kusudama: false,
            },
        });

        let json = serde_json::to_value(&head).unwrap();
        assert_eq!(json["type"], "balloon_head");
        assert_eq!(json["span"]["kind"], "balloon");
        assert_eq!(json["span"]["required_hits"], 5);
        assert!(json.get("head_index").is_none());
        assert_eq!(head.required_hits(), Some(5));
    }

    #[test]
    fn metadata_roundtrip_with_difficulty_keys() {
        let mut meta = ChartMetadata::default();
        meta.title.default = "Song".to_string();
        meta.title.by_language.insert("ja".to_string(), "曲".to_string());
        meta.courses.insert(
            Difficulty::Oni,
            CourseData {
                level: 8,
                balloon_counts: Some(vec![5, 10]),
                ..CourseData::default()
            },
        );

        let json = serde_json::to_string(&meta).unwrap();
        let back: ChartMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
        assert_eq!(back.title.get("ja"), "曲");
        assert_eq!(back.title.get("en"), "Song");
    }

    #[test]
    fn single_note_count_ignores_spans() {
        let mut streams = NoteStreams::default();
        streams.play_notes.push_back(don(0));
        let mut roll = don(1);
        roll.note_type = NoteType::DrumrollHead;
        streams.play_notes.push_back(roll);
        assert_eq!(streams.single_note_count(), 1);
        assert!(!streams.is_empty());
    }
}
