use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tja_schema::{CompiledCourse, Difficulty};

use crate::gameplay::session::SessionResult;

/// Content hash of a compiled course, independent of the file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChartId(pub String);

impl ChartId {
    pub fn of(course: &CompiledCourse) -> Self {
        Self(course.chart_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub title: String,
    pub difficulty: Difficulty,
    pub result: SessionResult,
}

impl ScoreRecord {
    pub fn new(course: &CompiledCourse, result: SessionResult) -> Self {
        Self {
            title: course.meta.title.default.clone(),
            difficulty: course.difficulty,
            result,
        }
    }
}

/// Keeps the best score per chart identity.
pub trait ScoreStore: Send + Sync {
    fn best(&self, id: &ChartId) -> Option<ScoreRecord>;

    /// Returns `true` when the record replaced the previous best.
    fn submit(&self, id: ChartId, record: ScoreRecord) -> bool;
}

#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    records: RwLock<HashMap<ChartId, ScoreRecord>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn best(&self, id: &ChartId) -> Option<ScoreRecord> {
        self.records.read().get(id).cloned()
    }

    fn submit(&self, id: ChartId, record: ScoreRecord) -> bool {
        let mut records = self.records.write();
        match records.get(&id) {
            Some(best) if best.result.score >= record.result.score => false,
            _ => {
                log::info!(
                    "new best for {} ({}): {}",
                    record.title,
                    record.difficulty,
                    record.result.score
                );
                records.insert(id, record);
                true
            }
        }
    }
}
