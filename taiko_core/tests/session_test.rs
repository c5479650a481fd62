use proptest::prelude::*;
use taiko_core::gameplay::judge::EngineState;
use taiko_core::gameplay::timing::Judgment;
use taiko_core::input::events::DrumHit;
use taiko_core::{GameConfig, PlaySession, SessionError};
use tja_compiler::compile_str;
use tja_schema::{CompiledCourse, Difficulty, DrumSide, NoteType};

fn course_with(header: &str, body: &str, difficulty: Difficulty) -> CompiledCourse {
    let src = format!("TITLE:Session\nBPM:120\n\n{header}\n\n#START\n{body}\n#END\n");
    compile_str(&src, difficulty).unwrap()
}

fn oni(body: &str) -> CompiledCourse {
    course_with("COURSE:Oni\nLEVEL:8\nBALLOON:2", body, Difficulty::Oni)
}

fn session(body: &str) -> PlaySession {
    PlaySession::new(oni(body), &GameConfig::default()).unwrap()
}

/// Hits every single note dead on, one frame per 16ms.
fn autoplay(session: &mut PlaySession, course: &CompiledCourse, until: f64) {
    let mut now = -3000.0;
    while now < until {
        let next = now + 16.0;
        let hits: Vec<DrumHit> = course
            .streams
            .play_notes
            .iter()
            .filter(|n| n.hit_ms > now && n.hit_ms <= next)
            .filter_map(|n| match n.note_type.side()? {
                DrumSide::Don => Some(DrumHit::don(n.hit_ms)),
                DrumSide::Kat => Some(DrumHit::kat(n.hit_ms)),
            })
            .collect();
        session.update(next, &hits);
        now = next;
    }
}

#[test]
fn unsupported_level_fails_before_play() {
    let easy = course_with("COURSE:Easy\nLEVEL:9", "1000,", Difficulty::Easy);
    let err = PlaySession::new(easy, &GameConfig::default()).err();
    assert_eq!(
        err,
        Some(SessionError::UnsupportedDifficultyLevel {
            difficulty: Difficulty::Easy,
            level: 9
        })
    );

    let tower = course_with("COURSE:Tower\nLEVEL:3", "1000,", Difficulty::Tower);
    assert!(PlaySession::new(tower, &GameConfig::default()).is_err());
}

#[test]
fn chart_without_course_line_is_playable() {
    let src = "TITLE:Bare\nBPM:120\nLEVEL:8\nBALLOON:5\n#START\n1000,\n7008,\n#END\n";
    let course = compile_str(src, Difficulty::Oni).unwrap();
    assert!(PlaySession::new(course, &GameConfig::default()).is_ok());
}

#[test]
fn full_combo_clears() {
    let course = oni("1020,3040,");
    let mut session = PlaySession::new(course.clone(), &GameConfig::default()).unwrap();
    autoplay(&mut session, &course, 5000.0);

    let result = session.snapshot();
    assert_eq!(result.good, 4);
    assert_eq!((result.ok, result.bad), (0, 0));
    assert_eq!(result.max_combo, 4);
    assert_eq!(result.score, 4 * u64::from(course.base_score));
    assert_eq!(result.gauge_length, 87.0);
    assert!(result.cleared);
    assert!(session.is_finished());
    assert!(session.active_notes().is_empty());
    assert!(session.active_bars().is_empty());
}

#[test]
fn frame_reports_miss_without_input() {
    let mut session = session("1000,");
    let frame = session.update(200.0, &[]);

    assert_eq!(frame.results.len(), 1);
    assert_eq!(frame.results[0].kind, Judgment::Miss);
    assert_eq!(session.snapshot().combo, 0);
    assert_eq!(session.snapshot().bad, 1);
    assert!(session.hit_queue().is_empty());
}

#[test]
fn hits_in_one_frame_are_judged_in_time_order() {
    let mut session = session("1100,");
    // Delivered out of order; notes at 0 and 500ms.
    let frame = session.update(600.0, &[DrumHit::don(500.0), DrumHit::don(0.0)]);

    let kinds: Vec<_> = frame.results.iter().map(|r| (r.note_index, r.kind)).collect();
    assert_eq!(kinds, vec![(0, Judgment::Good), (1, Judgment::Good)]);
    assert_eq!(session.snapshot().max_combo, 2);
}

#[test]
fn hit_crossing_a_span_head_counts_for_the_span() {
    // Drumroll from 0 to 1750ms; nothing else in the frame has happened yet.
    let mut session = session("5000000000000080,");
    let frame = session.update(16.0, &[DrumHit::kat(8.0)]);

    assert!(frame.results.is_empty());
    assert_eq!(session.snapshot().total_drumroll, 1);
    assert!(matches!(
        session.state(),
        EngineState::InDrumroll { count: 1, .. }
    ));
}

#[test]
fn late_hit_on_a_don_before_a_drumroll_is_judged() {
    // Don at 0ms, drumroll head 62.5ms later.
    let body = format!("15{}8{},", "0".repeat(14), "0".repeat(15));
    let mut session = session(&body);
    let frame = session.update(70.0, &[DrumHit::don(70.0)]);

    let kinds: Vec<_> = frame.results.iter().map(|r| (r.note_index, r.kind)).collect();
    assert_eq!(kinds, vec![(0, Judgment::Ok)]);
    assert_eq!(session.snapshot().total_drumroll, 0);
    assert!(matches!(
        session.state(),
        EngineState::InDrumroll { count: 0, .. }
    ));

    let later = session.update(400.0, &[]);
    assert!(later.results.is_empty());
    assert_eq!(session.snapshot().bad, 0);
}

#[test]
fn span_head_enters_with_its_tail() {
    // Head loads at -2000ms, tail at -250ms, the next don at 0ms.
    let mut session = session("5000000000000080,1000,");
    session.update(-2900.0, &[]);

    let active: Vec<NoteType> = session.active_notes().iter().map(|n| n.note_type).collect();
    assert_eq!(active, vec![NoteType::DrumrollHead, NoteType::TailMarker]);
    assert_eq!(session.active_bars().len(), 1);
}

#[test]
fn span_head_leaves_with_its_tail() {
    let mut session = session("5000000000000080,");
    session.update(-1500.0, &[]);
    assert_eq!(session.active_notes().len(), 2);

    // The head alone is off screen after ~956ms; the tail after ~2706ms.
    session.update(1000.0, &[]);
    assert_eq!(session.active_notes().len(), 2);
    assert!(session.active_bars().is_empty());

    session.update(2800.0, &[]);
    assert!(session.active_notes().is_empty());
}

#[test]
fn resolved_notes_leave_the_draw_buffer() {
    let mut session = session("1000,");
    session.update(-2500.0, &[]);
    assert_eq!(session.active_notes().len(), 1);

    session.update(0.0, &[DrumHit::don(0.0)]);
    assert!(session.active_notes().is_empty());
}

#[test]
fn drumroll_dims_and_recovers() {
    let mut session = session("5000000000000080,");
    session.update(-1500.0, &[]);

    session.update(
        100.0,
        &[DrumHit::don(50.0), DrumHit::kat(60.0), DrumHit::don(70.0)],
    );
    let colors: Vec<u8> = session.active_notes().iter().map(|n| n.color).collect();
    assert_eq!(colors, vec![225, 225]);

    session.update(116.0, &[]);
    assert_eq!(session.active_notes()[0].color, 226);
}

#[test]
fn popped_balloon_is_marked_for_drawing() {
    let mut session = session("7000000000000080,");
    session.update(-1500.0, &[]);
    session.update(100.0, &[DrumHit::don(10.0), DrumHit::don(20.0)]);

    let head = &session.active_notes()[0];
    assert_eq!(head.note_type, NoteType::BalloonHead);
    assert!(head.popped);
    assert_eq!(session.state(), EngineState::Waiting);
    assert_eq!(session.snapshot().combo, 1);
}

#[test]
fn demo_chart_autoplays_to_a_clear() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/sample.tja");
    let course = tja_compiler::compile_file(path, Difficulty::Oni).unwrap();
    let last = course
        .streams
        .play_notes
        .back()
        .map(|n| n.hit_ms)
        .unwrap_or_default();
    let mut session = PlaySession::new(course.clone(), &GameConfig::default()).unwrap();
    autoplay(&mut session, &course, last + 3000.0);

    let result = session.snapshot();
    assert_eq!(result.good as usize, course.streams.single_note_count());
    assert_eq!(result.bad, 0);
    assert!(result.cleared);
    assert!(session.is_finished());
}

fn glyph_measure() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('0'), Just('1'), Just('2')], 4..17)
        .prop_map(|glyphs| glyphs.into_iter().collect::<String>() + ",")
}

proptest! {
    #[test]
    fn every_single_is_resolved_exactly_once(
        measures in proptest::collection::vec(glyph_measure(), 1..5),
        jitter in proptest::collection::vec(-150.0f64..150.0, 64),
    ) {
        let course = oni(&measures.join("\n"));
        let mut session = PlaySession::new(course.clone(), &GameConfig::default()).unwrap();

        let mut hits: Vec<DrumHit> = course
            .streams
            .play_notes
            .iter()
            .zip(jitter.iter().cycle())
            .filter_map(|(n, j)| match n.note_type.side()? {
                DrumSide::Don => Some(DrumHit::don(n.hit_ms + j)),
                DrumSide::Kat => Some(DrumHit::kat(n.hit_ms + j)),
            })
            .collect();
        hits.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        let end = course.streams.play_notes.back().map(|n| n.hit_ms).unwrap_or_default() + 500.0;
        let mut now = -500.0;
        let mut judged = Vec::new();
        while now < end {
            let next = now + 16.0;
            let frame_hits: Vec<DrumHit> = hits
                .iter()
                .copied()
                .filter(|h| h.timestamp > now && h.timestamp <= next)
                .collect();
            let frame = session.update(next, &frame_hits);
            judged.extend(frame.results.into_iter().map(|r| r.note_index));

            let queue: Vec<f64> = session.hit_queue().iter().map(|n| n.hit_ms).collect();
            prop_assert!(queue.windows(2).all(|w| w[0] <= w[1]));
            now = next;
        }

        let singles = course.streams.single_note_count();
        prop_assert_eq!(judged.len(), singles);
        judged.sort_unstable();
        judged.dedup();
        prop_assert_eq!(judged.len(), singles);

        let result = session.snapshot();
        prop_assert_eq!((result.good + result.ok + result.bad) as usize, singles);
    }
}
