//! Test and helper mocks for gluview_core

use std::collections::VecDeque;

use gluview_traits::{GlucoseSource, HistoryStore, Sample};

/// A source that always errors on fetch; useful when driving the pipeline
/// with pre-merged history.
pub struct NoopSource;

impl GlucoseSource for NoopSource {
    fn fetch_recent(
        &mut self,
    ) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop source")))
    }
}

/// Replays prepared batches, one per fetch; empty forever afterwards.
#[derive(Default)]
pub struct ScriptedSource {
    batches: VecDeque<Vec<Sample>>,
    pub fetch_count: usize,
}

impl ScriptedSource {
    pub fn new(batches: impl IntoIterator<Item = Vec<Sample>>) -> Self {
        Self {
            batches: batches.into_iter().collect(),
            fetch_count: 0,
        }
    }
}

impl GlucoseSource for ScriptedSource {
    fn fetch_recent(
        &mut self,
    ) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        self.fetch_count += 1;
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}

/// In-memory history store recording every save.
#[derive(Default)]
pub struct MemoryStore {
    pub series: Vec<Sample>,
    pub save_count: usize,
}

impl MemoryStore {
    pub fn with_series(series: Vec<Sample>) -> Self {
        Self {
            series,
            save_count: 0,
        }
    }
}

impl HistoryStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.series.clone())
    }

    fn save(
        &mut self,
        series: &[Sample],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.series = series.to_vec();
        self.save_count += 1;
        Ok(())
    }
}
