use tja_schema::{Bar, Milliseconds, Moji, Note, NoteType};

use crate::lexer::{Measure, Token};
use crate::timing::{self, TimeSignature};
use crate::{ChartError, CompileOptions};

/// Commands that are understood but have no effect on timing or notes.
const IGNORED_COMMANDS: &[&str] = &[
    "LYRIC",
    "JPOSSCROLL",
    "NMSCROLL",
    "BMSCROLL",
    "HBSCROLL",
    "SECTION",
    "BRANCHSTART",
    "BRANCHEND",
    "N",
    "E",
    "M",
    "LEVELHOLD",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scroll {
    pub x: f64,
    pub y: f64,
}

impl Default for Scroll {
    fn default() -> Self {
        Self { x: 1.0, y: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserState {
    pub bpm: f64,
    pub signature: TimeSignature,
    pub scroll: Scroll,
    /// Placement cursor. Chart OFFSET is not applied here.
    pub current_ms: Milliseconds,
    pub barline_display: bool,
    pub gogo_time: bool,
}

impl ParserState {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            signature: TimeSignature::default(),
            scroll: Scroll::default(),
            current_ms: 0.0,
            barline_display: true,
            gogo_time: false,
        }
    }
}

/// Flat output of one course, in placement order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCourse {
    pub notes: Vec<Note>,
    pub bars: Vec<Bar>,
}

pub struct ChartParser {
    state: ParserState,
    distance: f64,
    strict: bool,
    next_index: usize,
}

impl ChartParser {
    pub fn new(initial_bpm: f64, options: &CompileOptions) -> Self {
        Self {
            state: ParserState::new(initial_bpm),
            distance: options.distance,
            strict: options.strict,
            next_index: 0,
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn parse(mut self, measures: &[Measure]) -> Result<ParsedCourse, ChartError> {
        let mut out = ParsedCourse::default();
        for (measure_no, measure) in measures.iter().enumerate() {
            self.parse_measure(measure_no, measure, &mut out)
                .map_err(|e| e.with_measure(measure_no))?;
        }
        Ok(out)
    }

    fn parse_measure(
        &mut self,
        measure_no: usize,
        measure: &Measure,
        out: &mut ParsedCourse,
    ) -> Result<(), ChartError> {
        let glyph_count = measure.glyph_count();
        let mut bar_placed = false;

        for token in &measure.tokens {
            match token {
                Token::Command { name, arg, line } => self.apply_command(name, arg, *line)?,
                Token::Glyph { glyph, line } => {
                    let ms_per_measure =
                        timing::measure_duration_ms(self.state.bpm, self.state.signature, *line)?;
                    if !bar_placed {
                        out.bars.push(self.bar(measure_no));
                        bar_placed = true;
                    }
                    match NoteType::from_glyph(*glyph) {
                        Some(note_type) => {
                            let note = self.note(note_type, measure_no, ms_per_measure);
                            out.notes.push(note);
                        }
                        None if *glyph == '0' => {}
                        None => log::debug!("line {line}: unknown glyph {glyph:?} treated as rest"),
                    }
                    self.state.current_ms += ms_per_measure / glyph_count as f64;
                }
            }
        }

        if glyph_count == 0 {
            let ms_per_measure =
                timing::measure_duration_ms(self.state.bpm, self.state.signature, measure.line)?;
            out.bars.push(self.bar(measure_no));
            self.state.current_ms += ms_per_measure;
        }
        Ok(())
    }

    fn scroll_rates(&self) -> (f64, f64) {
        let s = &self.state;
        (
            timing::pixels_per_frame(s.bpm, s.signature, s.scroll.x, self.distance),
            timing::pixels_per_frame(s.bpm, s.signature, s.scroll.y, self.distance),
        )
    }

    fn bar(&self, measure_no: usize) -> Bar {
        let (ppf_x, ppf_y) = self.scroll_rates();
        let hit_ms = self.state.current_ms;
        Bar {
            hit_ms,
            load_ms: timing::load_time_ms(hit_ms, ppf_x, self.distance),
            ppf_x,
            ppf_y,
            bpm: self.state.bpm,
            display: self.state.barline_display,
            measure: measure_no,
        }
    }

    fn note(&mut self, note_type: NoteType, measure_no: usize, ms_per_measure: f64) -> Note {
        let (ppf_x, ppf_y) = self.scroll_rates();
        let hit_ms = self.state.current_ms;
        let index = self.next_index;
        self.next_index += 1;

        let color = if note_type.is_drumroll() || note_type == NoteType::TailMarker {
            255
        } else {
            0
        };

        Note {
            note_type,
            hit_ms,
            load_ms: timing::load_time_ms(hit_ms, ppf_x, self.distance),
            ppf_x,
            ppf_y,
            index,
            measure: measure_no,
            measure_ms: ms_per_measure,
            bpm: self.state.bpm,
            gogo_time: self.state.gogo_time,
            moji: Moji::base(note_type),
            color,
            popped: false,
            span: None,
            head_index: None,
        }
    }

    fn apply_command(&mut self, name: &str, arg: &str, line: usize) -> Result<(), ChartError> {
        match name {
            "MEASURE" => self.state.signature = parse_signature(arg, line)?,
            "SCROLL" => {
                self.state.scroll = parse_scroll(arg).ok_or_else(|| invalid_argument(name, arg, line))?
            }
            "BPMCHANGE" => self.state.bpm = parse_float(name, arg, line)?,
            "BARLINEON" => self.state.barline_display = true,
            "BARLINEOFF" => self.state.barline_display = false,
            "GOGOSTART" => self.state.gogo_time = true,
            "GOGOEND" => self.state.gogo_time = false,
            "DELAY" => {
                let seconds = parse_float(name, arg, line)?;
                if seconds < 0.0 {
                    log::warn!("line {line}: negative #DELAY {seconds} ignored");
                } else {
                    self.state.current_ms += seconds * 1000.0;
                }
            }
            _ if IGNORED_COMMANDS.contains(&name) => {}
            _ if self.strict => {
                return Err(
                    ChartError::new("E5001", format!("unknown command: #{name}"), line)
                        .with_context(format!("#{name} {arg}")),
                );
            }
            _ => log::debug!("line {line}: unknown command #{name} skipped"),
        }
        Ok(())
    }
}

fn invalid_argument(name: &str, arg: &str, line: usize) -> ChartError {
    ChartError::new("E1004", format!("invalid argument for #{name}: {arg:?}"), line)
        .with_context(format!("#{name} {arg}"))
}

fn parse_float(name: &str, arg: &str, line: usize) -> Result<f64, ChartError> {
    arg.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_argument(name, arg, line))
}

fn parse_signature(arg: &str, line: usize) -> Result<TimeSignature, ChartError> {
    let (n, d) = arg
        .split_once('/')
        .ok_or_else(|| invalid_argument("MEASURE", arg, line))?;
    let numerator = parse_float("MEASURE", n.trim(), line)?;
    let denominator = parse_float("MEASURE", d.trim(), line)?;
    if numerator <= 0.0 || denominator <= 0.0 {
        return Err(invalid_argument("MEASURE", arg, line));
    }
    Ok(TimeSignature {
        numerator,
        denominator,
    })
}

/// `a`, `a+bi`, `a-bi` or `bi`. The imaginary part scrolls vertically.
pub fn parse_scroll(arg: &str) -> Option<Scroll> {
    let s = arg.trim();
    let Some(body) = s.strip_suffix('i') else {
        let x = s.parse::<f64>().ok().filter(|v| v.is_finite())?;
        return Some(Scroll { x, y: 0.0 });
    };

    let split = body.char_indices().rev().find(|&(i, c)| {
        i > 0 && (c == '+' || c == '-') && !body[..i].ends_with(|p: char| p == 'e' || p == 'E')
    });
    let (real, imaginary) = match split {
        Some((i, _)) => (&body[..i], &body[i..]),
        None => ("", body),
    };

    let x = if real.is_empty() {
        0.0
    } else {
        real.parse::<f64>().ok()?
    };
    let y = match imaginary {
        "" | "+" => 1.0,
        "-" => -1.0,
        v => v.parse::<f64>().ok()?,
    };
    (x.is_finite() && y.is_finite()).then_some(Scroll { x, y })
}
