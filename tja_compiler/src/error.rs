use tja_schema::Milliseconds;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartErrorKind {
    Malformed,
    InvalidTempo,
    MissingBalloonCount,
    UnknownCommand,
    Io,
}

impl ChartErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Structure: #START/#END, course selection, spans, command arguments
            "E1001" | "E1002" | "E1003" | "E1004" | "E1005" => Self::Malformed,

            "E2001" => Self::Io,

            "E3001" => Self::InvalidTempo,

            "E4001" => Self::MissingBalloonCount,

            "E5001" => Self::UnknownCommand,

            _ => Self::Malformed,
        }
    }

    /// Errors of these kinds abort loading the chart they were raised for.
    pub fn is_fatal(self) -> bool {
        !matches!(self, Self::UnknownCommand)
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (line {line})")]
pub struct ChartError {
    pub code: &'static str,
    pub kind: ChartErrorKind,
    pub message: String,
    pub line: usize,

    pub file: Option<String>,
    pub measure: Option<usize>,
    pub time_ms: Option<Milliseconds>,
    pub context: Option<String>,
}

impl ChartError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            kind: ChartErrorKind::from_code(code),
            message: message.into(),
            line,

            file: None,
            measure: None,
            time_ms: None,
            context: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_measure(mut self, measure: usize) -> Self {
        self.measure = Some(measure);
        self
    }

    pub fn with_time_ms(mut self, time_ms: Milliseconds) -> Self {
        self.time_ms = Some(time_ms);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
