use std::collections::{HashMap, VecDeque};

use tja_schema::{Bar, Note, NoteStreams, NoteType, Span, SpanKind};

use crate::moji;
use crate::parser::ParsedCourse;
use crate::ChartError;

/// Open drumroll/balloon awaiting its tail marker.
#[derive(Debug, Clone, Copy)]
struct OpenSpan {
    /// Position of the head in the kept-notes vector.
    slot: usize,
    kind: SpanKind,
}

/// Turns a parsed course into the play, draw and bar queues.
pub struct NoteStreamBuilder<'a> {
    balloon_counts: Option<&'a [u32]>,
}

impl<'a> NoteStreamBuilder<'a> {
    pub fn new(balloon_counts: Option<&'a [u32]>) -> Self {
        Self { balloon_counts }
    }

    pub fn build(&self, course: ParsedCourse) -> Result<NoteStreams, ChartError> {
        let mut notes = self.link_spans(course.notes)?;
        moji::classify(&mut notes);

        let draw_notes = draw_order(&notes);

        let mut play_notes = notes;
        play_notes.sort_by(|a, b| {
            a.hit_ms
                .total_cmp(&b.hit_ms)
                .then(a.index.cmp(&b.index))
        });

        let mut bars: Vec<Bar> = course.bars;
        bars.sort_by(|a, b| {
            a.load_ms
                .total_cmp(&b.load_ms)
                .then(a.measure.cmp(&b.measure))
        });

        Ok(NoteStreams {
            play_notes: VecDeque::from(play_notes),
            draw_notes,
            bars: VecDeque::from(bars),
        })
    }

    /// Pairs every span head with the next tail marker. Tails with nothing
    /// open are dropped.
    fn link_spans(&self, notes: Vec<Note>) -> Result<Vec<Note>, ChartError> {
        let mut kept: Vec<Note> = Vec::with_capacity(notes.len());
        let mut open: Option<OpenSpan> = None;
        let mut balloons_seen = 0usize;

        for mut note in notes {
            if note.note_type.opens_span() {
                if let Some(prev) = open {
                    let head = &kept[prev.slot];
                    return Err(span_error(
                        format!(
                            "span starting at note {} overlaps the unclosed span at note {}",
                            note.index, head.index
                        ),
                        &note,
                    ));
                }
                let kind = if note.note_type.is_balloon() {
                    let required_hits = self.balloon_count(balloons_seen, &note)?;
                    balloons_seen += 1;
                    SpanKind::Balloon {
                        required_hits,
                        is_kusudama: note.note_type == NoteType::KusudamaHead,
                    }
                } else {
                    SpanKind::Drumroll {
                        big: note.note_type == NoteType::BigDrumrollHead,
                    }
                };
                open = Some(OpenSpan {
                    slot: kept.len(),
                    kind,
                });
                kept.push(note);
                continue;
            }

            if note.note_type == NoteType::TailMarker {
                let Some(span) = open.take() else {
                    log::debug!(
                        "measure {}: tail marker without an open span dropped",
                        note.measure
                    );
                    continue;
                };
                let head = &mut kept[span.slot];
                head.span = Some(Span {
                    tail_index: note.index,
                    end_ms: note.hit_ms,
                    kind: span.kind,
                });
                note.head_index = Some(head.index);
                kept.push(note);
                continue;
            }

            kept.push(note);
        }

        if let Some(span) = open {
            let head = &kept[span.slot];
            return Err(span_error(
                format!("span starting at note {} is never closed", head.index),
                head,
            ));
        }
        Ok(kept)
    }

    fn balloon_count(&self, ordinal: usize, head: &Note) -> Result<u32, ChartError> {
        let counts = self.balloon_counts.ok_or_else(|| {
            ChartError::new(
                "E4001",
                "balloon note in a course without BALLOON:",
                0,
            )
            .with_measure(head.measure)
            .with_time_ms(head.hit_ms)
        })?;
        Ok(counts.get(ordinal).copied().unwrap_or_else(|| {
            log::warn!(
                "measure {}: BALLOON: lists {} counts, balloon #{} gets 0",
                head.measure,
                counts.len(),
                ordinal + 1
            );
            0
        }))
    }
}

fn span_error(message: String, note: &Note) -> ChartError {
    ChartError::new("E1003", message, 0)
        .with_measure(note.measure)
        .with_time_ms(note.hit_ms)
}

/// Ascending `load_ms`; a span tail is placed directly after its head so
/// the body is drawn between them.
fn draw_order(notes: &[Note]) -> VecDeque<Note> {
    let tails: HashMap<usize, &Note> = notes
        .iter()
        .filter_map(|n| n.head_index.map(|head| (head, n)))
        .collect();

    let mut heads: Vec<&Note> = notes
        .iter()
        .filter(|n| n.note_type != NoteType::TailMarker)
        .collect();
    heads.sort_by(|a, b| {
        a.load_ms
            .total_cmp(&b.load_ms)
            .then(a.index.cmp(&b.index))
    });

    let mut out = VecDeque::with_capacity(notes.len());
    for note in heads {
        out.push_back(note.clone());
        if let Some(tail) = tails.get(&note.index) {
            out.push_back((*tail).clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tja_schema::Moji;

    fn note(note_type: NoteType, hit_ms: f64, index: usize) -> Note {
        Note {
            note_type,
            hit_ms,
            load_ms: hit_ms - 2000.0,
            ppf_x: 7.2,
            ppf_y: 0.0,
            index,
            measure: 0,
            measure_ms: 2000.0,
            bpm: 120.0,
            gogo_time: false,
            moji: Moji::base(note_type),
            color: 0,
            popped: false,
            span: None,
            head_index: None,
        }
    }

    fn course(notes: Vec<Note>) -> ParsedCourse {
        ParsedCourse {
            notes,
            bars: Vec::new(),
        }
    }

    #[test]
    fn drumroll_head_links_to_tail() {
        let parsed = course(vec![
            note(NoteType::DrumrollHead, 0.0, 0),
            note(NoteType::TailMarker, 1000.0, 1),
        ]);
        let streams = NoteStreamBuilder::new(None).build(parsed).unwrap();
        let head = &streams.play_notes[0];
        let span = head.span.unwrap();
        assert_eq!(span.tail_index, 1);
        assert_eq!(span.end_ms, 1000.0);
        assert_eq!(span.kind, SpanKind::Drumroll { big: false });
        assert_eq!(streams.play_notes[1].head_index, Some(0));
    }

    #[test]
    fn stray_tail_is_dropped() {
        let parsed = course(vec![
            note(NoteType::Don, 0.0, 0),
            note(NoteType::TailMarker, 500.0, 1),
        ]);
        let streams = NoteStreamBuilder::new(None).build(parsed).unwrap();
        assert_eq!(streams.play_notes.len(), 1);
        assert_eq!(streams.draw_notes.len(), 1);
    }

    #[test]
    fn overlapping_spans_are_malformed() {
        let parsed = course(vec![
            note(NoteType::DrumrollHead, 0.0, 0),
            note(NoteType::BalloonHead, 500.0, 1),
            note(NoteType::TailMarker, 1000.0, 2),
        ]);
        let err = NoteStreamBuilder::new(Some(&[5][..])).build(parsed).unwrap_err();
        assert_eq!(err.code, "E1003");
    }

    #[test]
    fn unclosed_span_is_malformed() {
        let parsed = course(vec![note(NoteType::DrumrollHead, 0.0, 0)]);
        let err = NoteStreamBuilder::new(None).build(parsed).unwrap_err();
        assert_eq!(err.code, "E1003");
    }

    #[test]
    fn balloon_counts_are_positional() {
        let parsed = course(vec![
            note(NoteType::BalloonHead, 0.0, 0),
            note(NoteType::TailMarker, 500.0, 1),
            note(NoteType::KusudamaHead, 1000.0, 2),
            note(NoteType::TailMarker, 1500.0, 3),
            note(NoteType::BalloonHead, 2000.0, 4),
            note(NoteType::TailMarker, 2500.0, 5),
        ]);
        let streams = NoteStreamBuilder::new(Some(&[5, 20][..])).build(parsed).unwrap();
        let counts: Vec<Option<u32>> = streams
            .play_notes
            .iter()
            .filter(|n| n.note_type.is_balloon())
            .map(|n| n.required_hits())
            .collect();
        assert_eq!(counts, vec![Some(5), Some(20), Some(0)]);
    }

    #[test]
    fn balloon_without_declaration_fails() {
        let parsed = course(vec![
            note(NoteType::BalloonHead, 0.0, 0),
            note(NoteType::TailMarker, 500.0, 1),
        ]);
        let err = NoteStreamBuilder::new(None).build(parsed).unwrap_err();
        assert_eq!(err.code, "E4001");
    }

    #[test]
    fn draw_queue_keeps_tail_after_head() {
        let mut head = note(NoteType::DrumrollHead, 0.0, 0);
        head.load_ms = -2000.0;
        let mut don = note(NoteType::Don, 250.0, 1);
        // Faster scroll: loads after the head but before the tail would.
        don.load_ms = -500.0;
        let mut tail = note(NoteType::TailMarker, 3000.0, 2);
        tail.load_ms = 1000.0;
        let streams = NoteStreamBuilder::new(None)
            .build(course(vec![head, don, tail]))
            .unwrap();
        let order: Vec<usize> = streams.draw_notes.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }
}
