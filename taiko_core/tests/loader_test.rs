use std::time::Duration;

use taiko_core::loader::spawn_load;
use taiko_core::LoadError;
use tja_compiler::{ChartErrorKind, CompileOptions, Modifier};
use tja_schema::{Difficulty, NoteType};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/sample.tja");

#[test]
fn loads_a_course_in_the_background() {
    let course = spawn_load(SAMPLE, Difficulty::Normal, CompileOptions::default(), None)
        .wait()
        .unwrap();
    assert_eq!(course.difficulty, Difficulty::Normal);
    assert_eq!(course.level, 4);
    assert!(!course.streams.play_notes.is_empty());
    assert!(course.base_score > 0);
}

#[test]
fn try_take_eventually_yields_the_course() {
    let mut loader = spawn_load(SAMPLE, Difficulty::Oni, CompileOptions::default(), None);
    let mut result = None;
    for _ in 0..500 {
        if let Some(r) = loader.try_take() {
            result = Some(r);
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    let course = result.expect("loader never finished").unwrap();
    assert_eq!(course.difficulty, Difficulty::Oni);
}

#[test]
fn modifier_is_applied_before_hand_off() {
    let plain = spawn_load(SAMPLE, Difficulty::Oni, CompileOptions::default(), None)
        .wait()
        .unwrap();
    let mirrored = spawn_load(
        SAMPLE,
        Difficulty::Oni,
        CompileOptions::default(),
        Some(Modifier::Mirror),
    )
    .wait()
    .unwrap();

    for (a, b) in plain
        .streams
        .play_notes
        .iter()
        .zip(&mirrored.streams.play_notes)
    {
        assert_eq!(a.hit_ms, b.hit_ms);
        assert_eq!(a.note_type.mirrored(), b.note_type);
    }
    assert!(mirrored
        .streams
        .play_notes
        .iter()
        .any(|n| n.note_type == NoteType::Kat));
}

#[test]
fn errors_come_back_typed() {
    let err = spawn_load(
        "/nonexistent/chart.tja",
        Difficulty::Oni,
        CompileOptions::default(),
        None,
    )
    .wait()
    .unwrap_err();
    match err {
        LoadError::Chart(e) => {
            assert_eq!(e.kind, ChartErrorKind::Io);
            assert_eq!(e.code, "E2001");
        }
        other => panic!("unexpected error: {other}"),
    }

    let missing_course =
        spawn_load(SAMPLE, Difficulty::Easy, CompileOptions::default(), None).wait();
    assert!(matches!(
        missing_course,
        Err(LoadError::Chart(e)) if e.kind == ChartErrorKind::Malformed
    ));
}
