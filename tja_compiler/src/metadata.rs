use tja_schema::{ChartMetadata, CourseData, LocalizedText};

use crate::lexer::{CourseSection, LexedChart, SourceLine};
use crate::ChartError;

pub fn read_metadata(chart: &LexedChart) -> Result<ChartMetadata, ChartError> {
    let mut meta = ChartMetadata::default();

    for source in &chart.metadata {
        let Some((key, value)) = split_header(source) else {
            log::debug!("line {}: not a header line: {}", source.line, source.text);
            continue;
        };
        apply_song_header(&mut meta, &key, value, source.line)?;
    }

    for course in &chart.courses {
        let data = read_course(course)?;
        meta.courses.entry(course.difficulty).or_insert(data);
    }

    Ok(meta)
}

fn apply_song_header(
    meta: &mut ChartMetadata,
    key: &str,
    value: &str,
    line: usize,
) -> Result<(), ChartError> {
    if let Some(lang) = key.strip_prefix("SUBTITLE") {
        let value = strip_subtitle_marker(value);
        set_localized(&mut meta.subtitle, lang, value);
        return Ok(());
    }
    if let Some(lang) = key.strip_prefix("TITLE") {
        set_localized(&mut meta.title, lang, value);
        return Ok(());
    }

    match key {
        "BPM" => meta.bpm = parse_number(key, value, line)?,
        "WAVE" => meta.wave = non_empty(value),
        "OFFSET" => meta.offset_ms = parse_number(key, value, line)? * 1000.0,
        "DEMOSTART" => meta.demo_start_ms = parse_number(key, value, line)? * 1000.0,
        "BGMOVIE" => meta.bg_movie = non_empty(value),
        "SCENEPRESET" => meta.scene_preset = non_empty(value),
        _ => log::debug!("line {line}: header {key} ignored"),
    }
    Ok(())
}

fn read_course(course: &CourseSection) -> Result<CourseData, ChartError> {
    let mut data = CourseData::default();

    for source in &course.header {
        let Some((key, value)) = split_header(source) else {
            continue;
        };
        let line = source.line;
        match key.as_str() {
            "LEVEL" => {
                if !value.is_empty() {
                    data.level = parse_integer(&key, value, line)?;
                }
            }
            // An empty BALLOON: still counts as declared.
            "BALLOON" => data.balloon_counts = Some(parse_list(&key, value, line)?),
            "SCOREINIT" => {
                if !value.is_empty() {
                    data.score_init = Some(parse_list(&key, value, line)?);
                }
            }
            "SCOREDIFF" => {
                if !value.is_empty() {
                    data.score_diff = Some(parse_integer(&key, value, line)?);
                }
            }
            _ => log::debug!("line {line}: course header {key} ignored"),
        }
    }

    Ok(data)
}

fn split_header(source: &SourceLine) -> Option<(String, &str)> {
    let (key, value) = source.text.split_once(':')?;
    Some((key.trim().to_ascii_uppercase(), value.trim()))
}

fn set_localized(text: &mut LocalizedText, lang: &str, value: &str) {
    if lang.is_empty() {
        text.default = value.to_string();
    } else {
        text.by_language
            .insert(lang.to_ascii_lowercase(), value.to_string());
    }
}

fn strip_subtitle_marker(value: &str) -> &str {
    value
        .strip_prefix("--")
        .or_else(|| value.strip_prefix("++"))
        .unwrap_or(value)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_number(key: &str, value: &str, line: usize) -> Result<f64, ChartError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ChartError::new("E1005", format!("invalid {key}: {value:?}"), line)
                .with_context(format!("{key}:{value}"))
        })
}

fn parse_integer(key: &str, value: &str, line: usize) -> Result<u32, ChartError> {
    value.parse::<u32>().map_err(|_| {
        ChartError::new("E1005", format!("invalid {key}: {value:?}"), line)
            .with_context(format!("{key}:{value}"))
    })
}

fn parse_list(key: &str, value: &str, line: usize) -> Result<Vec<u32>, ChartError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_integer(key, item, line))
        .collect()
}
