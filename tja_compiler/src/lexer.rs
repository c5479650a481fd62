use tja_schema::Difficulty;

use crate::ChartError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `#NAME arg`; `name` is upper-cased, `arg` trimmed.
    Command {
        name: String,
        arg: String,
        line: usize,
    },
    Glyph {
        glyph: char,
        line: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measure {
    pub tokens: Vec<Token>,
    pub line: usize,
}

impl Measure {
    /// Subdivision count: every glyph, commands excluded.
    pub fn glyph_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, Token::Glyph { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_count() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSection {
    pub difficulty: Difficulty,
    pub line: usize,
    /// `KEY:VALUE` lines belonging to this course (`LEVEL`, `BALLOON`, ...).
    pub header: Vec<SourceLine>,
    /// Line of the first `#START`, if any.
    pub start_line: Option<usize>,
    /// Lines strictly between `#START` and `#END`.
    pub body: Vec<SourceLine>,
    pub closed: bool,
}

impl CourseSection {
    fn new(difficulty: Difficulty, line: usize) -> Self {
        Self {
            difficulty,
            line,
            header: Vec::new(),
            start_line: None,
            body: Vec::new(),
            closed: false,
        }
    }
}

/// Comment-free chart text split into song metadata and course sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexedChart {
    pub metadata: Vec<SourceLine>,
    pub courses: Vec<CourseSection>,
}

/// Removes a `//` comment. A comment at column 0 or after only whitespace
/// removes the whole line.
pub fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        None => line,
        Some(i) if line[..i].trim().is_empty() => "",
        Some(i) => &line[..i],
    }
}

/// Non-blank, comment-stripped, trimmed lines with their 1-based numbers.
pub fn clean_lines(src: &str) -> Vec<SourceLine> {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    src.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = strip_comment(raw).trim();
            (!text.is_empty()).then(|| SourceLine {
                line: i + 1,
                text: text.to_string(),
            })
        })
        .collect()
}

pub fn lex_chart(src: &str) -> LexedChart {
    let mut chart = LexedChart::default();
    let mut current: Option<CourseSection> = None;
    let mut in_body = false;
    let mut skipping_body = false;
    // Course keys seen before any COURSE: line; they belong to an implicit
    // oni course if one is opened by #START.
    let mut loose_keys: Vec<SourceLine> = Vec::new();

    for source in clean_lines(src) {
        let text = source.text.as_str();
        let upper = text.to_ascii_uppercase();

        if in_body || skipping_body {
            if upper == "#END" {
                if in_body {
                    if let Some(course) = current.as_mut() {
                        course.closed = true;
                    }
                }
                in_body = false;
                skipping_body = false;
            } else if in_body {
                if let Some(course) = current.as_mut() {
                    course.body.push(source);
                }
            }
            continue;
        }

        if let Some(value) = header_value(text, "COURSE") {
            if let Some(done) = current.take() {
                chart.courses.push(done);
            }
            chart.metadata.append(&mut loose_keys);
            let difficulty = value.parse::<Difficulty>().unwrap_or_else(|e| {
                log::warn!("line {}: {e}, treating course as oni", source.line);
                Difficulty::Oni
            });
            current = Some(CourseSection::new(difficulty, source.line));
            continue;
        }

        if upper == "#START" || upper.starts_with("#START ") {
            // A body before any COURSE: line belongs to oni.
            let course = current.get_or_insert_with(|| {
                let mut implicit = CourseSection::new(Difficulty::Oni, source.line);
                implicit.header = std::mem::take(&mut loose_keys);
                implicit
            });
            if course.start_line.is_some() {
                log::debug!(
                    "line {}: ignoring additional #START in {} course",
                    source.line,
                    course.difficulty
                );
                skipping_body = true;
            } else {
                course.start_line = Some(source.line);
                in_body = true;
            }
            continue;
        }

        if text.starts_with('#') {
            log::debug!("line {}: command outside a chart body ignored: {text}", source.line);
            continue;
        }

        match current.as_mut() {
            Some(course) if is_course_key(text) => course.header.push(source),
            None if is_course_key(text) => loose_keys.push(source),
            _ => chart.metadata.push(source),
        }
    }

    if let Some(done) = current.take() {
        chart.courses.push(done);
    }
    chart.metadata.append(&mut loose_keys);
    chart
}

impl LexedChart {
    pub fn course(&self, difficulty: Difficulty) -> Option<&CourseSection> {
        self.courses.iter().find(|c| c.difficulty == difficulty)
    }

    /// Measures of the selected course, commands kept in place.
    pub fn measures(&self, difficulty: Difficulty) -> Result<Vec<Measure>, ChartError> {
        let course = self.course(difficulty).ok_or_else(|| {
            ChartError::new("E1002", format!("course not found: {difficulty}"), 0)
        })?;
        let start_line = course.start_line.ok_or_else(|| {
            ChartError::new(
                "E1002",
                format!("course {difficulty} has no #START"),
                course.line,
            )
        })?;
        if !course.closed {
            return Err(ChartError::new(
                "E1001",
                format!("#START without matching #END in {difficulty} course"),
                start_line,
            ));
        }
        Ok(split_measures(&course.body))
    }
}

pub fn split_measures(body: &[SourceLine]) -> Vec<Measure> {
    let mut measures = Vec::new();
    let mut current = Measure::default();

    for source in body {
        if current.tokens.is_empty() {
            current.line = source.line;
        }

        if let Some(command) = source.text.strip_prefix('#') {
            let (name, arg) = split_command(command);
            current.tokens.push(Token::Command {
                name,
                arg,
                line: source.line,
            });
            continue;
        }

        for ch in source.text.chars() {
            match ch {
                ',' => {
                    if current.tokens.is_empty() {
                        current.line = source.line;
                    }
                    measures.push(std::mem::take(&mut current));
                    current.line = source.line;
                }
                c if c.is_whitespace() => {}
                glyph => current.tokens.push(Token::Glyph {
                    glyph,
                    line: source.line,
                }),
            }
        }
    }

    if !current.is_empty() {
        measures.push(current);
    } else if !current.tokens.is_empty() {
        log::debug!(
            "line {}: trailing commands after the last measure ignored",
            current.line
        );
    }
    measures
}

fn split_command(command: &str) -> (String, String) {
    let mut iter = command.splitn(2, char::is_whitespace);
    let name = iter.next().unwrap_or("").to_ascii_uppercase();
    let arg = iter.next().unwrap_or("").trim().to_string();
    (name, arg)
}

/// Value of `KEY:VALUE` when the line's key is exactly `key`.
pub(crate) fn header_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let (k, v) = text.split_once(':')?;
    k.trim().eq_ignore_ascii_case(key).then(|| v.trim())
}

fn is_course_key(text: &str) -> bool {
    ["LEVEL", "BALLOON", "SCOREINIT", "SCOREDIFF", "STYLE"]
        .iter()
        .any(|k| header_value(text, k).is_some())
}
