use serde::Serialize;

use super::series_index::SeriesIndex;
use crate::error::{ChartError, ChartResult};

/// Window centred on a located candle: `start..end` into the series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LocatedWindow {
    pub target: i64,
    pub position: usize,
    pub start: usize,
    pub end: usize,
}

impl LocatedWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Finds a close time and cuts a fixed-radius window around it.
#[derive(Clone, Copy, Debug)]
pub struct RangeLocator {
    radius: usize,
}

impl RangeLocator {
    pub fn new(radius: usize) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// `max(0, p - r) .. min(len, p + r + 1)`
    pub fn bounds(&self, len: usize, position: usize) -> (usize, usize) {
        let start = position.saturating_sub(self.radius);
        let end = len.min(position.saturating_add(self.radius).saturating_add(1));
        (start, end)
    }

    pub fn locate(&self, index: &SeriesIndex, len: usize, target: i64) -> ChartResult<LocatedWindow> {
        let position = index
            .position_of(target)
            .ok_or(ChartError::LookupMiss { timestamp: target })?;
        let (start, end) = self.bounds(len, position);
        Ok(LocatedWindow {
            target,
            position,
            start,
            end,
        })
    }
}
