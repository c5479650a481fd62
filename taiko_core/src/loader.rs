//! Compiles a chart off the game thread.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tja_compiler::{CompileOptions, Modifier};
use tja_schema::{CompiledCourse, Difficulty};

use crate::error::LoadError;

/// Handle to a chart being compiled on a worker thread. The course only
/// becomes visible once compilation has fully finished.
pub struct ChartLoader {
    receiver: Receiver<Result<CompiledCourse, LoadError>>,
    handle: Option<JoinHandle<()>>,
}

pub fn spawn_load(
    path: impl Into<PathBuf>,
    difficulty: Difficulty,
    options: CompileOptions,
    modifier: Option<Modifier>,
) -> ChartLoader {
    let path = path.into();
    let (sender, receiver) = bounded(1);
    let handle = thread::spawn(move || {
        log::debug!("loading {} ({difficulty})", path.display());
        let result = tja_compiler::compile_file_with_options(&path, difficulty, options)
            .map(|mut course| {
                if let Some(modifier) = modifier {
                    modifier.apply(&mut course.streams);
                }
                course
            })
            .map_err(LoadError::from);
        // The receiver may have been dropped by a screen that moved on.
        let _ = sender.send(result);
    });
    ChartLoader {
        receiver,
        handle: Some(handle),
    }
}

impl ChartLoader {
    /// Non-blocking. `None` while the worker is still compiling.
    pub fn try_take(&mut self) -> Option<Result<CompiledCourse, LoadError>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(LoadError::Disconnected))
            }
        }
    }

    pub fn wait(mut self) -> Result<CompiledCourse, LoadError> {
        let result = self.receiver.recv().unwrap_or(Err(LoadError::Disconnected));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("chart loader thread panicked");
            }
        }
    }
}
