use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tja_schema::{Bar, CompiledCourse, Difficulty, Milliseconds, Note, NoteStreams, NoteType};

use crate::config::GameConfig;
use crate::error::SessionError;
use crate::gameplay::gauge::Gauge;
use crate::gameplay::judge::{EngineState, JudgmentEngine, JudgmentResult, ScoreCard, SpanEvent};
use crate::input::events::DrumHit;
use crate::position::PositionMapper;

/// Colour lost per drumroll hit.
const DRUMROLL_DIM_PER_HIT: u32 = 10;

/// What one `update` produced for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub results: Vec<JudgmentResult>,
    pub span_events: Vec<SpanEvent>,
}

/// End-of-song (or current) totals, handed to a `ScoreStore`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub good: u32,
    pub ok: u32,
    pub bad: u32,
    pub total_drumroll: u32,
    pub gauge_length: f64,
    pub cleared: bool,
}

/// One player's run through one compiled course.
///
/// Owns every queue of the run; nothing is shared with other players.
pub struct PlaySession {
    difficulty: Difficulty,
    level: u32,
    chart_id: String,
    engine: JudgmentEngine,
    mapper: PositionMapper,

    pending_notes: VecDeque<Note>,
    pending_bars: VecDeque<Bar>,
    /// Ordered by `index`.
    active_notes: Vec<Note>,
    active_bars: Vec<Bar>,
    finish_logged: bool,
}

impl PlaySession {
    /// Fails before any note is played if the gauge table has no row for
    /// the course.
    pub fn new(course: CompiledCourse, config: &GameConfig) -> Result<Self, SessionError> {
        let total_notes = course.streams.single_note_count();
        let gauge = Gauge::new(&config.gauge, course.difficulty, course.level, total_notes)?;

        let NoteStreams {
            play_notes,
            draw_notes,
            bars,
        } = course.streams;
        log::info!(
            "session start: {} {} level {}, {} notes",
            course.meta.title.default,
            course.difficulty,
            course.level,
            total_notes
        );

        Ok(Self {
            difficulty: course.difficulty,
            level: course.level,
            chart_id: course.chart_id,
            engine: JudgmentEngine::new(
                play_notes,
                course.base_score,
                gauge,
                config.judge_offset_ms,
            ),
            mapper: PositionMapper::new(config.layout.clone()),
            pending_notes: draw_notes,
            pending_bars: bars,
            active_notes: Vec::new(),
            active_bars: Vec::new(),
            finish_logged: false,
        })
    }

    /// Runs one frame. `hits` is the input sampled for this frame; each hit
    /// is judged once, in timestamp order, against the queue as it stood at
    /// the hit's own time.
    pub fn update(&mut self, now: Milliseconds, hits: &[DrumHit]) -> Frame {
        let mut hits = hits.to_vec();
        hits.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        for hit in &hits {
            self.engine.check_misses(hit.timestamp);
            self.engine.process_input(hit);
        }
        self.engine.check_misses(now);

        let resolved = self.engine.drain_resolved();
        if !resolved.is_empty() {
            self.pending_notes.retain(|n| !resolved.contains(&n.index));
            self.active_notes.retain(|n| !resolved.contains(&n.index));
        }

        self.update_draw(now);

        let span_events = self.engine.drain_span_events();
        for event in &span_events {
            self.apply_span_event(event);
        }

        let frame = Frame {
            results: self.engine.drain_results(),
            span_events,
        };
        if self.engine.is_finished() && !self.finish_logged {
            self.finish_logged = true;
            let result = self.snapshot();
            log::info!(
                "session finished: score {} max combo {} gauge {:.2}",
                result.score,
                result.max_combo,
                result.gauge_length
            );
        }
        frame
    }

    fn update_draw(&mut self, now: Milliseconds) {
        let horizon = now + self.mapper.layout().draw_lookahead_ms;

        while self.pending_notes.front().is_some_and(|n| n.load_ms <= horizon) {
            let Some(note) = self.pending_notes.pop_front() else {
                break;
            };
            let head_index = note.note_type.opens_span().then_some(note.index);
            insert_by_index(&mut self.active_notes, note);
            // A head never enters the buffer without its tail.
            if let Some(head_index) = head_index {
                if self
                    .pending_notes
                    .front()
                    .is_some_and(|t| t.head_index == Some(head_index))
                {
                    if let Some(tail) = self.pending_notes.pop_front() {
                        insert_by_index(&mut self.active_notes, tail);
                    }
                }
            }
        }

        while self.pending_bars.front().is_some_and(|b| b.load_ms <= horizon) {
            if let Some(bar) = self.pending_bars.pop_front() {
                let pos = self
                    .active_bars
                    .partition_point(|b| b.measure <= bar.measure);
                self.active_bars.insert(pos, bar);
            }
        }

        for note in &mut self.active_notes {
            // Only drumroll parts are ever dimmed.
            let is_roll_part =
                note.note_type.is_drumroll() || note.note_type == NoteType::TailMarker;
            if is_roll_part && note.color > 0 && note.color < 255 {
                note.color += 1;
            }
        }

        let mapper = &self.mapper;
        let gone: Vec<usize> = self
            .active_notes
            .iter()
            .filter(|note| {
                // Spans leave with their tail.
                let anchor = note
                    .span
                    .and_then(|span| find_by_index(&self.active_notes, span.tail_index))
                    .unwrap_or(*note);
                mapper.is_gone(now, anchor.load_ms, anchor.hit_ms, anchor.ppf_x)
            })
            .map(|note| note.index)
            .collect();
        if !gone.is_empty() {
            self.active_notes.retain(|n| !gone.contains(&n.index));
        }
        self.active_bars
            .retain(|b| !mapper.is_gone(now, b.load_ms, b.hit_ms, b.ppf_x));
    }

    fn apply_span_event(&mut self, event: &SpanEvent) {
        match *event {
            SpanEvent::DrumrollTick { head_index, count } => {
                let dim = count.saturating_mul(DRUMROLL_DIM_PER_HIT);
                let color = 255u32.saturating_sub(dim) as u8;
                for note in self.active_notes.iter_mut().filter(|n| {
                    n.index == head_index || n.head_index == Some(head_index)
                }) {
                    note.color = color;
                }
            }
            SpanEvent::BalloonPopped { head_index } => {
                if let Some(head) = self
                    .active_notes
                    .iter_mut()
                    .find(|n| n.index == head_index)
                {
                    head.popped = true;
                }
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> SessionResult {
        let card = self.engine.card();
        let gauge = self.engine.gauge();
        SessionResult {
            score: card.score,
            combo: card.combo,
            max_combo: card.max_combo,
            good: card.good,
            ok: card.ok,
            bad: card.bad,
            total_drumroll: card.total_drumroll,
            gauge_length: gauge.length(),
            cleared: gauge.is_cleared(),
        }
    }

    /// Every note has been judged or passed and no span is open.
    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn card(&self) -> &ScoreCard {
        self.engine.card()
    }

    pub fn gauge(&self) -> &Gauge {
        self.engine.gauge()
    }

    /// Notes still waiting to be judged, in hit order.
    pub fn hit_queue(&self) -> &VecDeque<Note> {
        self.engine.queue()
    }

    pub fn active_notes(&self) -> &[Note] {
        &self.active_notes
    }

    pub fn active_bars(&self) -> &[Bar] {
        &self.active_bars
    }

    pub fn mapper(&self) -> &PositionMapper {
        &self.mapper
    }

    /// Draw list for this frame: active notes with their screen positions.
    pub fn note_positions(&self, now: Milliseconds) -> Vec<(&Note, Vec2)> {
        self.active_notes
            .iter()
            .map(|n| (n, self.mapper.note_position(n, now)))
            .collect()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn chart_id(&self) -> &str {
        &self.chart_id
    }
}

fn insert_by_index(notes: &mut Vec<Note>, note: Note) {
    let pos = match notes.binary_search_by_key(&note.index, |n| n.index) {
        Ok(pos) | Err(pos) => pos,
    };
    notes.insert(pos, note);
}

fn find_by_index(notes: &[Note], index: usize) -> Option<&Note> {
    notes
        .binary_search_by_key(&index, |n| n.index)
        .ok()
        .map(|pos| &notes[pos])
}
