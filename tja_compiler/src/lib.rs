use std::{
    fs,
    path::{Path, PathBuf},
};

use encoding_rs::{SHIFT_JIS, UTF_8};
use tja_schema::{ChartMetadata, CompiledCourse, Difficulty};

pub mod chart_id;
pub mod error;
pub mod lexer;
pub mod metadata;
pub mod modifier;
pub mod moji;
pub mod parser;
pub mod resources;
pub mod score;
pub mod stream;
pub mod timing;

pub use error::{ChartError, ChartErrorKind};
pub use modifier::Modifier;
pub use resources::{resolve_resources, ChartResources};

use lexer::lex_chart;
use parser::ChartParser;
use stream::NoteStreamBuilder;

/// Spawn-to-judgment travel in pixels for a 1280-wide field.
pub const DEFAULT_DISTANCE: f64 = 866.0;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub base_dir: Option<PathBuf>,
    /// Pixels a note travels from spawn to the judgment circle.
    pub distance: f64,
    /// Unknown commands fail with E5001 instead of being skipped.
    pub strict: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            distance: DEFAULT_DISTANCE,
            strict: false,
        }
    }
}

pub fn read_chart_file(path: impl AsRef<Path>) -> Result<String, ChartError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        ChartError::new("E2001", format!("failed to read chart: {e}"), 0)
            .with_file(path.display().to_string())
    })?;
    Ok(decode_chart_bytes(&bytes))
}

/// UTF-8 (BOM stripped) when the bytes are valid UTF-8, Shift-JIS otherwise.
pub fn decode_chart_bytes(bytes: &[u8]) -> String {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    log::debug!("chart is not UTF-8, decoding as Shift-JIS");
    let (text, _, _) = SHIFT_JIS.decode(bytes);
    text.into_owned()
}

/// Song metadata and every course's header, without compiling any body.
pub fn read_metadata_str(src: &str) -> Result<ChartMetadata, ChartError> {
    metadata::read_metadata(&lex_chart(src))
}

/// Courses that have a body, in difficulty order.
pub fn available_courses(src: &str) -> Vec<Difficulty> {
    let lexed = lex_chart(src);
    let mut out: Vec<Difficulty> = lexed
        .courses
        .iter()
        .filter(|c| c.start_line.is_some())
        .map(|c| c.difficulty)
        .collect();
    out.sort();
    out.dedup();
    out
}

pub fn compile_file(
    path: impl AsRef<Path>,
    difficulty: Difficulty,
) -> Result<CompiledCourse, ChartError> {
    compile_file_with_options(path, difficulty, CompileOptions::default())
}

/// `options.base_dir` is replaced by the chart's directory.
pub fn compile_file_with_options(
    path: impl AsRef<Path>,
    difficulty: Difficulty,
    options: CompileOptions,
) -> Result<CompiledCourse, ChartError> {
    let path = path.as_ref();
    let src = read_chart_file(path)?;
    let options = CompileOptions {
        base_dir: path.parent().map(|p| p.to_path_buf()),
        ..options
    };
    compile_str_with_options(&src, difficulty, options)
        .map_err(|e| e.with_file(path.display().to_string()))
}

pub fn compile_str(src: &str, difficulty: Difficulty) -> Result<CompiledCourse, ChartError> {
    compile_str_with_options(src, difficulty, CompileOptions::default())
}

pub fn compile_str_with_options(
    src: &str,
    difficulty: Difficulty,
    options: CompileOptions,
) -> Result<CompiledCourse, ChartError> {
    let lexed = lex_chart(src);
    let meta = metadata::read_metadata(&lexed)?;
    let measures = lexed.measures(difficulty)?;
    let course = meta.courses.get(&difficulty).cloned().unwrap_or_default();

    let parsed = ChartParser::new(meta.bpm, &options).parse(&measures)?;
    let streams = NoteStreamBuilder::new(course.balloon_counts.as_deref()).build(parsed)?;

    let base_score = score::base_score(&streams.play_notes);
    let chart_id = chart_id::chart_id(&streams);
    log::debug!(
        "compiled {difficulty}: {} notes, {} bars, base score {base_score}",
        streams.play_notes.len(),
        streams.bars.len()
    );

    Ok(CompiledCourse {
        meta,
        difficulty,
        level: course.level,
        base_score,
        chart_id,
        streams,
    })
}
