use tja_schema::{Moji, Note, NoteType};

/// Assigns sound-effect lettering. `notes` must be in placement order.
///
/// A small don or kat followed by the same type at most an eighth of its
/// measure minus one millisecond later reads `Do`/`Ka`. The middle of three
/// dons less than an eighth apart, with no close note on either side of the
/// group, reads `Ko`.
pub fn classify(notes: &mut [Note]) {
    for i in 0..notes.len() {
        let note_type = notes[i].note_type;
        let mut moji = Moji::base(note_type);
        if matches!(note_type, NoteType::Don | NoteType::Kat) {
            if let Some(next) = notes.get(i + 1) {
                if next.note_type == note_type && paired(&notes[i], next) {
                    moji = if note_type == NoteType::Don {
                        Moji::Do
                    } else {
                        Moji::Ka
                    };
                }
            }
        }
        notes[i].moji = moji;
    }

    for i in 1..notes.len().saturating_sub(1) {
        let (a, b, c) = (&notes[i - 1], &notes[i], &notes[i + 1]);
        let all_don = [a, b, c].iter().all(|n| n.note_type == NoteType::Don);
        if !all_don || !close(a, b) || !close(b, c) {
            continue;
        }
        let open_before = i < 2 || !close(&notes[i - 2], a);
        let open_after = notes.get(i + 2).map_or(true, |d| !close(c, d));
        if open_before && open_after {
            notes[i].moji = Moji::Ko;
        }
    }
}

fn paired(earlier: &Note, later: &Note) -> bool {
    later.hit_ms - earlier.hit_ms <= later.measure_ms / 8.0 - 1.0
}

fn close(earlier: &Note, later: &Note) -> bool {
    later.hit_ms - earlier.hit_ms < later.measure_ms / 8.0
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn letters(notes: &[Note]) -> Vec<Moji> {
        notes.iter().map(|n| n.moji).collect()
    }

    #[test]
    fn sixteenths_pair_up() {
        // 125 ms apart, measure 2000 ms: under the 250 ms threshold.
        let mut notes = vec![
            note(NoteType::Don, 0.0, 0),
            note(NoteType::Don, 125.0, 1),
            note(NoteType::Kat, 1000.0, 2),
            note(NoteType::Kat, 1125.0, 3),
        ];
        classify(&mut notes);
        assert_eq!(
            letters(&notes),
            vec![Moji::Do, Moji::Don, Moji::Ka, Moji::Katsu]
        );
    }

    #[test]
    fn eighth_notes_stay_plain() {
        let mut notes = vec![note(NoteType::Don, 0.0, 0), note(NoteType::Don, 250.0, 1)];
        classify(&mut notes);
        assert_eq!(letters(&notes), vec![Moji::Don, Moji::Don]);
    }

    #[test]
    fn pair_needs_a_full_millisecond_under_the_eighth() {
        let mut notes = vec![
            note(NoteType::Don, 0.0, 0),
            note(NoteType::Don, 249.5, 1),
            note(NoteType::Kat, 1000.0, 2),
            note(NoteType::Kat, 1249.0, 3),
        ];
        classify(&mut notes);
        assert_eq!(
            letters(&notes),
            vec![Moji::Don, Moji::Don, Moji::Ka, Moji::Katsu]
        );
    }

    #[test]
    fn isolated_triplet_gets_ko() {
        let mut notes = vec![
            note(NoteType::Don, 0.0, 0),
            note(NoteType::Don, 125.0, 1),
            note(NoteType::Don, 250.0, 2),
            note(NoteType::Kat, 1000.0, 3),
        ];
        classify(&mut notes);
        assert_eq!(
            letters(&notes),
            vec![Moji::Do, Moji::Ko, Moji::Don, Moji::Katsu]
        );
    }

    #[test]
    fn run_of_four_has_no_ko() {
        let mut notes: Vec<Note> = (0..4)
            .map(|i| note(NoteType::Don, i as f64 * 125.0, i))
            .collect();
        classify(&mut notes);
        assert!(notes.iter().all(|n| n.moji != Moji::Ko));
    }

    #[test]
    fn big_and_span_notes_keep_base_letters() {
        let mut notes = vec![
            note(NoteType::BigDon, 0.0, 0),
            note(NoteType::BigDon, 100.0, 1),
            note(NoteType::DrumrollHead, 200.0, 2),
            note(NoteType::TailMarker, 800.0, 3),
        ];
        classify(&mut notes);
        assert_eq!(
            letters(&notes),
            vec![Moji::DaiDon, Moji::DaiDon, Moji::Renda, Moji::SpanEnd]
        );
    }
}
