use tja_schema::{Note, SpanKind};

/// Points a full-length drumroll is worth per second of duration.
pub const DRUMROLL_POINTS_PER_SECOND: f64 = 1692.008;
/// Points reserved per required balloon hit.
pub const BALLOON_POINTS_PER_HIT: f64 = 100.0;
pub const MAX_SCORE: f64 = 1_000_000.0;

/// Points for a Good on a single note, rounded up to a multiple of ten.
///
/// The million-point budget is reduced by what drumrolls and balloons can
/// earn, the remainder spread over single notes. Zero when the course has
/// no single notes or the budget is already spent.
pub fn base_score<'a>(notes: impl IntoIterator<Item = &'a Note>) -> u32 {
    let mut singles = 0usize;
    let mut drumroll_seconds = 0.0;
    let mut balloon_hits = 0u64;

    for note in notes {
        if note.note_type.is_single() {
            singles += 1;
            continue;
        }
        match note.span.map(|s| (s, s.kind)) {
            Some((span, SpanKind::Drumroll { .. })) => {
                drumroll_seconds += span.duration_ms(note.hit_ms).max(0.0) / 1000.0;
            }
            Some((_, SpanKind::Balloon { required_hits, .. })) => {
                balloon_hits += u64::from(required_hits);
            }
            None => {}
        }
    }

    if singles == 0 {
        return 0;
    }
    let budget = MAX_SCORE
        - BALLOON_POINTS_PER_HIT * balloon_hits as f64
        - DRUMROLL_POINTS_PER_SECOND * drumroll_seconds;
    let per_note = (budget / singles as f64 / 10.0).ceil() * 10.0;
    if per_note <= 0.0 {
        0
    } else {
        per_note as u32
    }
}

/// An Ok is worth half a Good, rounded down to a multiple of ten.
pub fn ok_score(base: u32) -> u32 {
    base / 2 / 10 * 10
}
