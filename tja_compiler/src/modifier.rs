//! Note-type remapping over compiled streams.
//!
//! Modifiers change which drum face a single note asks for. They never
//! touch timestamps and never reorder a queue; after remapping, the
//! sound-effect lettering is recomputed.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tja_schema::{Moji, NoteStreams, NoteType};

use crate::moji;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Modifier {
    /// Don becomes kat and kat becomes don, sizes kept.
    Mirror,
    /// Single-note types are shuffled within each measure.
    RandomPerMeasure { seed: u64 },
    /// Consecutive single notes swap types pairwise.
    Shuffle,
}

impl Modifier {
    pub fn apply(self, streams: &mut NoteStreams) {
        let remap = self.remap(streams);
        if remap.is_empty() {
            return;
        }

        for note in streams
            .play_notes
            .iter_mut()
            .chain(streams.draw_notes.iter_mut())
        {
            if let Some(&note_type) = remap.get(&note.index) {
                note.note_type = note_type;
            }
        }

        refresh_moji(streams);
        log::debug!("{self:?} remapped {} notes", remap.len());
    }

    /// New type per note index, computed over single notes in hit order.
    fn remap(self, streams: &NoteStreams) -> HashMap<usize, NoteType> {
        let singles: Vec<(usize, usize, NoteType)> = streams
            .play_notes
            .iter()
            .filter(|n| n.note_type.is_single())
            .map(|n| (n.index, n.measure, n.note_type))
            .collect();

        match self {
            Self::Mirror => singles
                .iter()
                .map(|&(index, _, t)| (index, t.mirrored()))
                .collect(),
            Self::Shuffle => {
                let mut out = HashMap::new();
                for pair in singles.chunks_exact(2) {
                    let (a, _, a_type) = pair[0];
                    let (b, _, b_type) = pair[1];
                    out.insert(a, b_type);
                    out.insert(b, a_type);
                }
                out
            }
            Self::RandomPerMeasure { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut by_measure: BTreeMap<usize, Vec<(usize, NoteType)>> = BTreeMap::new();
                for &(index, measure, t) in &singles {
                    by_measure.entry(measure).or_default().push((index, t));
                }

                let mut out = HashMap::new();
                for notes in by_measure.values() {
                    let mut types: Vec<NoteType> = notes.iter().map(|&(_, t)| t).collect();
                    types.shuffle(&mut rng);
                    for (&(index, _), t) in notes.iter().zip(types) {
                        out.insert(index, t);
                    }
                }
                out
            }
        }
    }
}

/// Lettering depends on neighbouring types, so it is rebuilt from the
/// play queue and copied to the draw queue by index.
fn refresh_moji(streams: &mut NoteStreams) {
    let mut ordered: Vec<_> = streams.play_notes.iter().cloned().collect();
    ordered.sort_by_key(|n| n.index);
    moji::classify(&mut ordered);

    let letters: HashMap<usize, Moji> = ordered.iter().map(|n| (n.index, n.moji)).collect();
    for note in streams
        .play_notes
        .iter_mut()
        .chain(streams.draw_notes.iter_mut())
    {
        if let Some(&m) = letters.get(&note.index) {
            note.moji = m;
        }
    }
}
