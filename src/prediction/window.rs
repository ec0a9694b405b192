//! Fixed-capacity sliding window of error samples
//!
//! Samples are appended at the back and the oldest are evicted from the front
//! once the capacity is reached.

use crate::events::ErrorDataPoint;
use std::collections::VecDeque;

/// FIFO buffer of the most recent error samples
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    points: VecDeque<ErrorDataPoint>,
    capacity: usize,
}

impl SlidingWindow {
    /// Create an empty window holding at most `capacity` samples
    ///
    /// A capacity of zero is treated as one so the window can always hold the
    /// most recent sample.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil::prediction::SlidingWindow;
    ///
    /// let window = SlidingWindow::new(168);
    /// assert!(window.is_empty());
    /// ```
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest ones beyond capacity
    ///
    /// # Returns
    ///
    /// Number of samples evicted
    pub fn push(&mut self, point: ErrorDataPoint) -> usize {
        self.points.push_back(point);
        self.enforce_capacity()
    }

    /// The last `count` samples in chronological order
    pub fn tail(&self, count: usize) -> impl Iterator<Item = &ErrorDataPoint> {
        let skip = self.points.len().saturating_sub(count);
        self.points.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorDataPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&ErrorDataPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.points.len() > self.capacity {
            self.points.pop_front();
            evicted += 1;
        }
        evicted
    }
}
