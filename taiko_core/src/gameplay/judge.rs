use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tja_compiler::score::ok_score;
use tja_schema::{DrumSide, Milliseconds, Note, NoteType, SpanKind};

use crate::gameplay::gauge::Gauge;
use crate::gameplay::timing::{classify, Judgment, BAD_WINDOW_MS};
use crate::input::events::DrumHit;

/// Points per drumroll or balloon hit.
pub const SPAN_HIT_POINTS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentResult {
    pub kind: Judgment,
    pub is_big: bool,
    /// Input time minus hit time; positive is late. For a miss, the time
    /// the note was given up.
    pub signed_offset_ms: Milliseconds,
    pub note_index: usize,
}

/// Feedback for the drumroll counter and balloon animations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SpanEvent {
    DrumrollStarted { head_index: usize, big: bool },
    DrumrollTick { head_index: usize, count: u32 },
    DrumrollEnded { head_index: usize, count: u32 },
    BalloonStarted { head_index: usize, required: u32 },
    BalloonHit { head_index: usize, count: u32, required: u32 },
    BalloonPopped { head_index: usize },
    /// The tail passed before enough hits.
    BalloonExpired { head_index: usize, count: u32, required: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineState {
    Waiting,
    InDrumroll {
        head_index: usize,
        big: bool,
        count: u32,
    },
    InBalloon {
        head_index: usize,
        required: u32,
        count: u32,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub good: u32,
    pub ok: u32,
    /// Bads and misses.
    pub bad: u32,
    pub total_drumroll: u32,
}

impl ScoreCard {
    fn extend_combo(&mut self) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }
}

/// Consumes the hit-check queue in `hit_ms` order.
///
/// All times passed in are chart times; the judge offset is subtracted
/// before any comparison with a note.
pub struct JudgmentEngine {
    queue: VecDeque<Note>,
    state: EngineState,
    card: ScoreCard,
    gauge: Gauge,
    good_points: u64,
    ok_points: u64,
    judge_offset_ms: Milliseconds,

    results: Vec<JudgmentResult>,
    span_events: Vec<SpanEvent>,
    resolved: Vec<usize>,
}

impl JudgmentEngine {
    pub fn new(
        queue: VecDeque<Note>,
        base_score: u32,
        gauge: Gauge,
        judge_offset_ms: Milliseconds,
    ) -> Self {
        Self {
            queue,
            state: EngineState::Waiting,
            card: ScoreCard::default(),
            gauge,
            good_points: u64::from(base_score),
            ok_points: u64::from(ok_score(base_score)),
            judge_offset_ms,
            results: Vec::new(),
            span_events: Vec::new(),
            resolved: Vec::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn card(&self) -> &ScoreCard {
        &self.card
    }

    pub fn gauge(&self) -> &Gauge {
        &self.gauge
    }

    pub fn queue(&self) -> &VecDeque<Note> {
        &self.queue
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() && self.state == EngineState::Waiting
    }

    /// Judges one strike. Returns whether it counted for anything.
    pub fn process_input(&mut self, hit: &DrumHit) -> bool {
        let now = hit.timestamp - self.judge_offset_ms;
        match self.state {
            EngineState::InDrumroll {
                head_index,
                big,
                count,
            } => {
                let count = count + 1;
                self.state = EngineState::InDrumroll {
                    head_index,
                    big,
                    count,
                };
                self.card.score += SPAN_HIT_POINTS;
                self.card.total_drumroll += 1;
                self.span_events
                    .push(SpanEvent::DrumrollTick { head_index, count });
                true
            }
            EngineState::InBalloon {
                head_index,
                required,
                count,
            } if hit.side == DrumSide::Don => {
                let count = count + 1;
                self.card.score += SPAN_HIT_POINTS;
                self.span_events.push(SpanEvent::BalloonHit {
                    head_index,
                    count,
                    required,
                });
                if count >= required {
                    self.pop_balloon(head_index);
                } else {
                    self.state = EngineState::InBalloon {
                        head_index,
                        required,
                        count,
                    };
                }
                true
            }
            _ => self.judge_single(hit.side, now),
        }
    }

    fn judge_single(&mut self, side: DrumSide, now: Milliseconds) -> bool {
        // The nearest unresolved single note decides; span notes are
        // handled by `check_misses`.
        let Some(pos) = self.queue.iter().position(|n| n.note_type.is_single()) else {
            return false;
        };
        let note = &self.queue[pos];
        if note.note_type.side() != Some(side) {
            return false;
        }
        let offset = now - note.hit_ms;
        let Some(kind) = classify(offset) else {
            return false;
        };

        let Some(note) = self.queue.remove(pos) else {
            return false;
        };
        match kind {
            Judgment::Good => {
                self.card.good += 1;
                self.card.score += self.good_points;
                self.card.extend_combo();
                self.gauge.add_good();
            }
            Judgment::Ok => {
                self.card.ok += 1;
                self.card.score += self.ok_points;
                self.card.extend_combo();
                self.gauge.add_ok();
            }
            Judgment::Bad | Judgment::Miss => {
                self.card.bad += 1;
                self.card.combo = 0;
                self.gauge.add_bad();
            }
        }
        self.resolve(&note, kind, offset);
        true
    }

    /// Advances time: gives up on singles past the Bad window and enters
    /// or leaves spans whose head or tail has been crossed.
    pub fn check_misses(&mut self, now: Milliseconds) {
        let now = now - self.judge_offset_ms;
        while let Some(note) = self.queue.front() {
            if note.hit_ms > now {
                break;
            }
            // A single still inside its window holds back every later note,
            // spans included.
            if note.note_type.is_single() && now <= note.hit_ms + BAD_WINDOW_MS {
                break;
            }
            let Some(note) = self.queue.pop_front() else {
                break;
            };
            if note.note_type.is_single() {
                self.miss(&note, now);
            } else if note.note_type == NoteType::TailMarker {
                self.close_span(&note);
            } else {
                self.open_span(&note);
            }
        }
    }

    fn miss(&mut self, note: &Note, now: Milliseconds) {
        self.card.bad += 1;
        self.card.combo = 0;
        self.gauge.add_bad();
        log::trace!("note {} missed", note.index);
        self.resolve(note, Judgment::Miss, now - note.hit_ms);
    }

    fn resolve(&mut self, note: &Note, kind: Judgment, offset: Milliseconds) {
        self.results.push(JudgmentResult {
            kind,
            is_big: note.is_big(),
            signed_offset_ms: offset,
            note_index: note.index,
        });
        self.resolved.push(note.index);
    }

    fn open_span(&mut self, head: &Note) {
        let Some(span) = head.span else {
            return;
        };
        if self.state != EngineState::Waiting {
            log::warn!("note {}: span opened while another is active", head.index);
        }
        match span.kind {
            SpanKind::Drumroll { big } => {
                self.state = EngineState::InDrumroll {
                    head_index: head.index,
                    big,
                    count: 0,
                };
                self.span_events.push(SpanEvent::DrumrollStarted {
                    head_index: head.index,
                    big,
                });
            }
            SpanKind::Balloon { required_hits, .. } => {
                self.span_events.push(SpanEvent::BalloonStarted {
                    head_index: head.index,
                    required: required_hits,
                });
                if required_hits == 0 {
                    self.pop_balloon(head.index);
                } else {
                    self.state = EngineState::InBalloon {
                        head_index: head.index,
                        required: required_hits,
                        count: 0,
                    };
                }
            }
        }
    }

    fn close_span(&mut self, tail: &Note) {
        match self.state {
            EngineState::InDrumroll {
                head_index, count, ..
            } if tail.head_index == Some(head_index) => {
                self.span_events
                    .push(SpanEvent::DrumrollEnded { head_index, count });
                self.state = EngineState::Waiting;
            }
            EngineState::InBalloon {
                head_index,
                required,
                count,
            } if tail.head_index == Some(head_index) => {
                self.span_events.push(SpanEvent::BalloonExpired {
                    head_index,
                    count,
                    required,
                });
                self.state = EngineState::Waiting;
            }
            _ => {}
        }
    }

    fn pop_balloon(&mut self, head_index: usize) {
        self.card.extend_combo();
        self.span_events.push(SpanEvent::BalloonPopped { head_index });
        self.state = EngineState::Waiting;
    }

    pub fn drain_results(&mut self) -> Vec<JudgmentResult> {
        std::mem::take(&mut self.results)
    }

    pub fn drain_span_events(&mut self) -> Vec<SpanEvent> {
        std::mem::take(&mut self.span_events)
    }

    /// Indices of notes resolved by a judgment since the last call.
    pub fn drain_resolved(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.resolved)
    }
}
