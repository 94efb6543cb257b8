use std::collections::HashMap;
use tracing::debug;

use crate::data::types::Candle;
use crate::error::{ChartError, ChartResult};

/// Bijective `close_time -> position` map over one loaded series.
///
/// Rebuilt from scratch on every load; a duplicate key fails the whole build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeriesIndex {
    positions: HashMap<i64, usize>,
}

impl SeriesIndex {
    pub fn build(candles: &[Candle]) -> ChartResult<Self> {
        let mut positions = HashMap::with_capacity(candles.len());
        for (position, candle) in candles.iter().enumerate() {
            if let Some(first) = positions.insert(candle.close_time, position) {
                return Err(ChartError::DuplicateKey {
                    close_time: candle.close_time,
                    first,
                    second: position,
                });
            }
        }
        debug!("[INDEX] Indexed {} candles", positions.len());
        Ok(Self { positions })
    }

    pub fn position_of(&self, close_time: i64) -> Option<usize> {
        self.positions.get(&close_time).copied()
    }

    pub fn contains(&self, close_time: i64) -> bool {
        self.positions.contains_key(&close_time)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Close times must strictly increase along the series.
pub fn check_chronological(candles: &[Candle]) -> ChartResult<()> {
    for (i, pair) in candles.windows(2).enumerate() {
        if pair[1].close_time <= pair[0].close_time {
            return Err(ChartError::structural(format!(
                "candle #{}: closeTime {} does not follow {}",
                i + 1,
                pair[1].close_time,
                pair[0].close_time
            )));
        }
    }
    Ok(())
}
