use glam::Vec2;
use serde::{Deserialize, Serialize};
use tja_schema::{Bar, Milliseconds, Note};

/// ppf is pixels per frame at 60 fps; 60 / 1000 turns it into pixels per ms.
const FRAMES_PER_MS: f64 = 0.06;

/// Lane geometry in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub screen_width: f64,
    pub note_width: f64,
    pub visual_offset: f64,
    /// x of the judgment circle.
    pub judge_x: f64,
    /// Notes left of this are dropped from the draw buffer.
    pub despawn_x: f64,
    /// y of the lane centre; complex scroll moves notes away from it.
    pub reference_y: f64,
    /// How early before `load_ms` a note enters the draw buffer.
    pub draw_lookahead_ms: Milliseconds,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            screen_width: 1280.0,
            note_width: 64.0,
            visual_offset: 0.0,
            judge_x: 350.0,
            despawn_x: -64.0,
            reference_y: 184.0,
            draw_lookahead_ms: 1000.0,
        }
    }
}

impl Layout {
    /// Spawn-to-judgment span; pass it to the compiler as `distance`.
    pub fn travel_distance(&self) -> f64 {
        self.screen_width - self.note_width - self.visual_offset - self.judge_x
    }
}

/// Screen position of scrolling objects. Drawing and despawning go through
/// the same formula.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMapper {
    layout: Layout,
}

impl PositionMapper {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn x(&self, now: Milliseconds, load_ms: Milliseconds, ppf_x: f64) -> f64 {
        self.layout.screen_width + ppf_x * FRAMES_PER_MS * (load_ms - now)
            - self.layout.note_width
            - self.layout.visual_offset
    }

    pub fn y(&self, now: Milliseconds, hit_ms: Milliseconds, ppf_y: f64) -> f64 {
        self.layout.reference_y - ppf_y * FRAMES_PER_MS * (hit_ms - now)
    }

    pub fn note_position(&self, note: &Note, now: Milliseconds) -> Vec2 {
        Vec2::new(
            self.x(now, note.load_ms, note.ppf_x) as f32,
            self.y(now, note.hit_ms, note.ppf_y) as f32,
        )
    }

    pub fn bar_position(&self, bar: &Bar, now: Milliseconds) -> Vec2 {
        Vec2::new(
            self.x(now, bar.load_ms, bar.ppf_x) as f32,
            self.y(now, bar.hit_ms, bar.ppf_y) as f32,
        )
    }

    /// Whether an object has scrolled past the despawn line. Objects that
    /// do not move leftwards are kept until `draw_lookahead_ms` after their
    /// hit time.
    pub fn is_gone(
        &self,
        now: Milliseconds,
        load_ms: Milliseconds,
        hit_ms: Milliseconds,
        ppf_x: f64,
    ) -> bool {
        if ppf_x > 0.0 {
            self.x(now, load_ms, ppf_x) < self.layout.despawn_x
        } else {
            now > hit_ms + self.layout.draw_lookahead_ms
        }
    }
}

impl Default for PositionMapper {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}
