use sha2::{Digest, Sha256};
use tja_schema::{NoteStreams, NoteType};

/// Lower-case SHA-256 hex of the note and bar sequences.
///
/// Depends only on what is played and shown, so renaming or moving the
/// chart file keeps its identity. Modifiers should be applied after this.
pub fn chart_id(streams: &NoteStreams) -> String {
    let mut hasher = Sha256::new();

    hasher.update((streams.play_notes.len() as u64).to_le_bytes());
    for note in &streams.play_notes {
        hasher.update([type_tag(note.note_type)]);
        hasher.update(note.hit_ms.to_bits().to_le_bytes());
        hasher.update(note.load_ms.to_bits().to_le_bytes());
        hasher.update(note.ppf_x.to_bits().to_le_bytes());
        hasher.update(note.ppf_y.to_bits().to_le_bytes());
        if let Some(required) = note.required_hits() {
            hasher.update(required.to_le_bytes());
        }
    }

    hasher.update((streams.bars.len() as u64).to_le_bytes());
    for bar in &streams.bars {
        hasher.update([type_tag(NoteType::Barline)]);
        hasher.update(bar.hit_ms.to_bits().to_le_bytes());
        hasher.update(bar.load_ms.to_bits().to_le_bytes());
        hasher.update([u8::from(bar.display)]);
    }

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn type_tag(note_type: NoteType) -> u8 {
    note_type.glyph().map_or(b'|', |c| c as u8)
}
