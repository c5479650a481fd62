use thiserror::Error;
use tja_compiler::ChartError;
use tja_schema::Difficulty;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// Raised by `PlaySession::new`, never mid-song.
    #[error("no gauge entry for {difficulty} level {level}")]
    UnsupportedDifficultyLevel { difficulty: Difficulty, level: u32 },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("chart loader thread exited without a result")]
    Disconnected,
}
