pub mod clock;
pub mod sample;

pub use clock::{Clock, WallClock};
pub use sample::Sample;

/// Supplies freshly fetched readings. Implementations own authentication,
/// transport, and retry concerns; batches may overlap previous fetches and
/// may contain time gaps.
pub trait GlucoseSource {
    fn fetch_recent(&mut self)
    -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Persists merged reading history across refresh cycles. The storage medium
/// is the implementation's concern; callers only see ordered sample series.
pub trait HistoryStore {
    fn load(&mut self) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>>;
    fn save(&mut self, series: &[Sample])
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: GlucoseSource + ?Sized> GlucoseSource for Box<T> {
    fn fetch_recent(
        &mut self,
    ) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).fetch_recent()
    }
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn load(&mut self) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).load()
    }

    fn save(
        &mut self,
        series: &[Sample],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).save(series)
    }
}
