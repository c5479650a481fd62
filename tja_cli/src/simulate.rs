use taiko_core::input::events::{DrumHit, DrumPad};
use taiko_core::{GameConfig, PlaySession, SessionResult};
use tja_schema::{CompiledCourse, DrumSide, Milliseconds, SpanKind};

/// Roughly one frame at 60 fps.
const FRAME_MS: Milliseconds = 16.0;
/// Autoplay drumroll rate, 15 hits per second.
const DRUMROLL_INTERVAL_MS: Milliseconds = 1000.0 / 15.0;

/// Plays the course perfectly: every single note dead on, drumrolls at a
/// fixed rate, balloons popped.
pub fn run_simulation(chart: CompiledCourse, config: &GameConfig) -> anyhow::Result<SessionResult> {
    let hits = autoplay_hits(&chart, config.judge_offset_ms);
    let first_load = chart
        .streams
        .draw_notes
        .iter()
        .map(|n| n.load_ms)
        .fold(0.0, f64::min);
    let last_hit = chart
        .streams
        .play_notes
        .iter()
        .map(|n| n.hit_ms)
        .fold(0.0, f64::max);

    let mut session = PlaySession::new(chart, config)?;

    let mut now = first_load - config.layout.draw_lookahead_ms;
    let end = last_hit + config.judge_offset_ms + 1000.0;
    let mut next_hit = 0;
    let mut frames = 0usize;
    while now < end || !session.is_finished() {
        let frame_end = now + FRAME_MS;
        let start = next_hit;
        while next_hit < hits.len() && hits[next_hit].timestamp <= frame_end {
            next_hit += 1;
        }
        let frame = session.update(frame_end, &hits[start..next_hit]);
        for result in &frame.results {
            log::debug!(
                "{:>9.1} note {:>4} {:?} ({:+.1} ms)",
                frame_end,
                result.note_index,
                result.kind,
                result.signed_offset_ms
            );
        }
        now = frame_end;
        frames += 1;
        if now > end + 60_000.0 {
            log::warn!("session still open a minute after the last note");
            break;
        }
    }
    log::info!("simulated {frames} frames");

    Ok(session.snapshot())
}

/// Inputs in timestamp order, alternating hands.
fn autoplay_hits(chart: &CompiledCourse, judge_offset_ms: Milliseconds) -> Vec<DrumHit> {
    let mut hits = Vec::new();
    let mut right = false;
    let mut strike = |side: DrumSide, at: Milliseconds, hits: &mut Vec<DrumHit>| {
        let pad = match (side, right) {
            (DrumSide::Don, false) => DrumPad::LeftDon,
            (DrumSide::Don, true) => DrumPad::RightDon,
            (DrumSide::Kat, false) => DrumPad::LeftKat,
            (DrumSide::Kat, true) => DrumPad::RightKat,
        };
        right = !right;
        hits.push(pad.hit(at + judge_offset_ms));
    };

    for note in &chart.streams.play_notes {
        if let Some(side) = note.note_type.side() {
            strike(side, note.hit_ms, &mut hits);
            continue;
        }
        let Some(span) = note.span else {
            continue;
        };
        let duration = span.duration_ms(note.hit_ms);
        match span.kind {
            SpanKind::Drumroll { .. } => {
                let mut at = note.hit_ms;
                while at < span.end_ms {
                    strike(DrumSide::Don, at, &mut hits);
                    at += DRUMROLL_INTERVAL_MS;
                }
            }
            SpanKind::Balloon { required_hits, .. } => {
                let step = duration / f64::from(required_hits + 1);
                for k in 1..=required_hits {
                    strike(DrumSide::Don, note.hit_ms + step * f64::from(k), &mut hits);
                }
            }
        }
    }

    hits.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    hits
}

pub fn print_result(result: &SessionResult) {
    println!("score:      {}", result.score);
    println!("good:       {}", result.good);
    println!("ok:         {}", result.ok);
    println!("bad:        {}", result.bad);
    println!("max combo:  {}", result.max_combo);
    println!("drumroll:   {}", result.total_drumroll);
    println!("gauge:      {:.2}", result.gauge_length);
    println!("cleared:    {}", if result.cleared { "yes" } else { "no" });
}
