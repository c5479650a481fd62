//! Runtime side of a taiko play session: judgment, gauge, scroll positions,
//! input plumbing, the audio clock and background chart loading.

pub mod config;
pub mod error;
pub mod gameplay;
pub mod input;
pub mod loader;
pub mod position;
pub mod records;
pub mod time;

pub use config::GameConfig;
pub use error::{LoadError, SessionError};
pub use gameplay::session::{PlaySession, SessionResult};
