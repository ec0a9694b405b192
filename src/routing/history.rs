use crate::events::{HistoricalResolution, Timestamp};
use chrono::Duration;
use std::collections::{BTreeMap, VecDeque};

/// Append-only log of resolution outcomes with a hard size cap
///
/// Once the cap is reached the oldest resolution is dropped for every new one.
#[derive(Debug, Clone)]
pub struct ResolutionHistory {
    entries: VecDeque<HistoricalResolution>,
    max_size: usize,
}

impl Default for ResolutionHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ResolutionHistory {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Append a resolution
    ///
    /// # Returns
    ///
    /// The evicted resolution, if the log was full
    pub fn record(&mut self, resolution: HistoricalResolution) -> Option<HistoricalResolution> {
        self.entries.push_back(resolution);
        if self.entries.len() > self.max_size {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Number of resolutions in the window `(at - window, at]`
    ///
    /// Resolutions are not assumed to arrive in chronological order.
    pub fn count_within(&self, at: Timestamp, window: Duration) -> usize {
        let cutoff = at - window;
        self.entries
            .iter()
            .filter(|r| r.timestamp > cutoff && r.timestamp <= at)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoricalResolution> {
        self.entries.iter()
    }

    pub fn successes(&self) -> usize {
        self.entries.iter().filter(|r| r.success).count()
    }

    /// Percentage of successful resolutions, 0 when the log is empty
    pub fn success_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        100.0 * self.successes() as f64 / self.entries.len() as f64
    }

    /// Mean resolution time in minutes, 0 when the log is empty
    pub fn average_resolution_time(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().map(|r| r.resolution_time).sum::<f64>() / self.entries.len() as f64
    }

    pub fn counts_by_team(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for resolution in &self.entries {
            *counts.entry(resolution.team_id.clone()).or_insert(0) += 1;
        }
        counts
    }
}
