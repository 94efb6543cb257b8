use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use super::types::{EnhancedAnnotation, Signal, SupportResistanceLevel, TimeMarker, ZoneTrend};

/// Every collection the session can load or clear independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Candles,
    Signals,
    Levels,
    Trends,
    Annotations,
    Markers,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Candles => "candles",
            Collection::Signals => "signals",
            Collection::Levels => "levels",
            Collection::Trends => "trends",
            Collection::Annotations => "annotations",
            Collection::Markers => "markers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-owning reference to an element of an append-only collection.
///
/// Clearing the collection bumps its generation, so a handle taken before the
/// clear resolves to `None` afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayHandle {
    pub generation: u64,
    pub index: usize,
}

/// Owns the overlay collections and their lifecycle rules.
#[derive(Clone, Debug, Default)]
pub struct OverlayStore {
    signals: Vec<Signal>,
    signal_generation: u64,
    levels: Vec<SupportResistanceLevel>,
    trends: Vec<ZoneTrend>,
    trend_generation: u64,
    annotations: BTreeMap<i64, EnhancedAnnotation>,
    markers: Vec<TimeMarker>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_signals(&mut self, batch: Vec<Signal>) {
        self.signals.extend(batch);
    }

    pub fn append_levels(&mut self, batch: Vec<SupportResistanceLevel>) {
        self.levels.extend(batch);
    }

    pub fn append_trends(&mut self, batch: Vec<ZoneTrend>) {
        self.trends.extend(batch);
    }

    /// Key-by-key merge, last write wins.
    pub fn merge_annotations(&mut self, batch: BTreeMap<i64, EnhancedAnnotation>) {
        self.annotations.extend(batch);
    }

    /// Markers are a single set: a new batch replaces the old one.
    pub fn replace_markers(&mut self, batch: Vec<TimeMarker>) {
        self.markers = batch;
    }

    /// Empties one collection. `Candles` is owned by the session and ignored here.
    pub fn clear(&mut self, collection: Collection) {
        match collection {
            Collection::Signals => {
                self.signals.clear();
                self.signal_generation += 1;
            }
            Collection::Levels => self.levels.clear(),
            Collection::Trends => {
                self.trends.clear();
                self.trend_generation += 1;
            }
            Collection::Annotations => self.annotations.clear(),
            Collection::Markers => self.markers.clear(),
            Collection::Candles => return,
        }
        info!("🧹 [STORE] Cleared {}", collection);
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn levels(&self) -> &[SupportResistanceLevel] {
        &self.levels
    }

    pub fn trends(&self) -> &[ZoneTrend] {
        &self.trends
    }

    pub fn annotations(&self) -> &BTreeMap<i64, EnhancedAnnotation> {
        &self.annotations
    }

    pub fn annotation(&self, close_time: i64) -> Option<&EnhancedAnnotation> {
        self.annotations.get(&close_time)
    }

    pub fn markers(&self) -> &[TimeMarker] {
        &self.markers
    }

    pub fn signal_handle(&self, index: usize) -> OverlayHandle {
        OverlayHandle {
            generation: self.signal_generation,
            index,
        }
    }

    pub fn trend_handle(&self, index: usize) -> OverlayHandle {
        OverlayHandle {
            generation: self.trend_generation,
            index,
        }
    }

    pub fn resolve_signal(&self, handle: OverlayHandle) -> Option<&Signal> {
        if handle.generation != self.signal_generation {
            return None;
        }
        self.signals.get(handle.index)
    }

    pub fn resolve_trend(&self, handle: OverlayHandle) -> Option<&ZoneTrend> {
        if handle.generation != self.trend_generation {
            return None;
        }
        self.trends.get(handle.index)
    }
}
