//! Joins the sparse overlay streams onto candle close times.
//!
//! Lookups are exact-match on `close_time`. When a Signal and a ZoneTrend hit
//! the same candle the Signal is the primary overlay, both for click dispatch
//! and for the marker the renderer draws.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::constants::style;
use crate::data::store::{OverlayHandle, OverlayStore};
use crate::data::types::{
    Bias, Candle, EnhancedAnnotation, LevelKind, Signal, SupportResistanceLevel, ZoneTrend,
};

/// Group items by timestamp, keeping insertion order within each group.
pub fn index_by_timestamp<'a, T, F>(items: &'a [T], key: F) -> HashMap<i64, Vec<&'a T>>
where
    F: Fn(&T) -> i64,
{
    let mut map: HashMap<i64, Vec<&'a T>> = HashMap::new();
    for item in items {
        map.entry(key(item)).or_default().push(item);
    }
    map
}

/// Same grouping as [`index_by_timestamp`] but yields positions into `items`.
pub fn index_positions_by_timestamp<T, F>(items: &[T], key: F) -> HashMap<i64, Vec<usize>>
where
    F: Fn(&T) -> i64,
{
    let mut map: HashMap<i64, Vec<usize>> = HashMap::new();
    for (position, item) in items.iter().enumerate() {
        map.entry(key(item)).or_default().push(position);
    }
    map
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Signal,
    Trend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Above,
    Below,
}

impl Bias {
    pub fn color(&self) -> &'static str {
        match self {
            Bias::Bullish => style::BULLISH_COLOR,
            Bias::Bearish => style::BEARISH_COLOR,
        }
    }

    pub fn placement(&self) -> Placement {
        match self {
            Bias::Bullish => Placement::Above,
            Bias::Bearish => Placement::Below,
        }
    }
}

/// Everything that touches one candle.
#[derive(Clone, Debug, Default)]
pub struct OverlaysAt<'a> {
    pub signals: Vec<&'a Signal>,
    pub trend: Option<&'a ZoneTrend>,
    pub annotation: Option<&'a EnhancedAnnotation>,
    pub marked: bool,
}

impl OverlaysAt<'_> {
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty() && self.trend.is_none() && self.annotation.is_none() && !self.marked
    }
}

/// The single overlay chosen for click dispatch and marker drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrimaryOverlay<'a> {
    Signal {
        signal: &'a Signal,
        handle: OverlayHandle,
    },
    Trend {
        trend: &'a ZoneTrend,
        handle: OverlayHandle,
    },
}

impl PrimaryOverlay<'_> {
    pub fn kind(&self) -> OverlayKind {
        match self {
            PrimaryOverlay::Signal { .. } => OverlayKind::Signal,
            PrimaryOverlay::Trend { .. } => OverlayKind::Trend,
        }
    }

    pub fn bias(&self) -> Bias {
        match self {
            PrimaryOverlay::Signal { signal, .. } => signal.action.bias(),
            PrimaryOverlay::Trend { trend, .. } => trend.direction.bias(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrimaryOverlay::Signal { signal, .. } => signal.action.as_str(),
            PrimaryOverlay::Trend { trend, .. } => trend.direction.as_str(),
        }
    }
}

/// Where and how the primary marker of a candle is drawn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerDecoration {
    pub kind: OverlayKind,
    pub label: &'static str,
    pub bias: Bias,
    pub placement: Placement,
    pub price: Decimal,
    pub color: &'static str,
}

/// Per-candle rendering contract; the renderer needs no business rules.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandleDecoration {
    pub close_time: i64,
    pub body_color: &'static str,
    pub stroke_color: Option<&'static str>,
    pub stroke_width: u32,
    pub marker: Option<MarkerDecoration>,
    pub signal_count: usize,
    pub has_trend: bool,
    pub has_annotation: bool,
    pub marked: bool,
    pub highlighted: bool,
}

/// Horizontal support/resistance reference line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelLine {
    pub kind: LevelKind,
    pub price: Decimal,
    pub touches: u32,
    pub color: &'static str,
    pub stroke_width: f64,
    pub dashed: bool,
    pub label: String,
}

impl LevelLine {
    pub fn from_level(level: &SupportResistanceLevel) -> Self {
        let color = match level.kind {
            LevelKind::Support => style::BULLISH_COLOR,
            LevelKind::Resistance => style::BEARISH_COLOR,
        };
        let stroke_width = (f64::from(level.touches) / style::TOUCHES_PER_WIDTH_STEP)
            .clamp(style::LEVEL_MIN_WIDTH, style::LEVEL_MAX_WIDTH);

        Self {
            kind: level.kind,
            price: level.price,
            touches: level.touches,
            color,
            stroke_width,
            dashed: level.kind == LevelKind::Resistance,
            label: format!(
                "{}: {} ({} touches)",
                level.kind.as_str().to_uppercase(),
                level.price,
                level.touches
            ),
        }
    }
}

/// Marker price: `offset` of the high above it, or of the low below it.
/// Falls back to the bare high/low when the shift overflows.
pub fn marker_price(candle: &Candle, bias: Bias, offset: Decimal) -> Decimal {
    match bias.placement() {
        Placement::Above => candle
            .high
            .checked_mul(offset)
            .and_then(|shift| candle.high.checked_add(shift))
            .unwrap_or(candle.high),
        Placement::Below => candle
            .low
            .checked_mul(offset)
            .and_then(|shift| candle.low.checked_sub(shift))
            .unwrap_or(candle.low),
    }
}

/// Timestamp indexes over the contents of an [`OverlayStore`].
///
/// Holds positions only; lookups borrow the store they were built from.
#[derive(Clone, Debug, Default)]
pub struct OverlayJoiner {
    signals_at: HashMap<i64, Vec<usize>>,
    trends_at: HashMap<i64, Vec<usize>>,
    markers: HashSet<i64>,
}

impl OverlayJoiner {
    pub fn build(store: &OverlayStore) -> Self {
        let joiner = Self {
            signals_at: index_positions_by_timestamp(store.signals(), Signal::close_time),
            trends_at: index_positions_by_timestamp(store.trends(), |t: &ZoneTrend| {
                t.timestamp_of_swing
            }),
            markers: store.markers().iter().copied().collect(),
        };
        debug!(
            "[JOIN] Indexed {} signal keys, {} trend keys, {} markers",
            joiner.signals_at.len(),
            joiner.trends_at.len(),
            joiner.markers.len()
        );
        joiner
    }

    pub fn overlays_at<'s>(&self, store: &'s OverlayStore, close_time: i64) -> OverlaysAt<'s> {
        let signals: Vec<&Signal> = self
            .signals_at
            .get(&close_time)
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&i| store.signals().get(i))
                    .collect()
            })
            .unwrap_or_default();

        let trend = self
            .first_trend_position(close_time)
            .and_then(|i| store.trends().get(i));

        OverlaysAt {
            signals,
            trend,
            annotation: store.annotation(close_time),
            marked: self.is_marked(close_time),
        }
    }

    /// Signal first (earliest inserted), then trend, else nothing.
    pub fn primary_overlay_at<'s>(
        &self,
        store: &'s OverlayStore,
        close_time: i64,
    ) -> Option<PrimaryOverlay<'s>> {
        if let Some(&index) = self.signals_at.get(&close_time).and_then(|p| p.first()) {
            if let Some(signal) = store.signals().get(index) {
                return Some(PrimaryOverlay::Signal {
                    signal,
                    handle: store.signal_handle(index),
                });
            }
        }

        let index = self.first_trend_position(close_time)?;
        store.trends().get(index).map(|trend| PrimaryOverlay::Trend {
            trend,
            handle: store.trend_handle(index),
        })
    }

    pub fn has_signal(&self, close_time: i64) -> bool {
        self.signals_at.contains_key(&close_time)
    }

    pub fn is_marked(&self, close_time: i64) -> bool {
        self.markers.contains(&close_time)
    }

    pub fn decorate(
        &self,
        store: &OverlayStore,
        candle: &Candle,
        highlighted: Option<i64>,
        offset: Decimal,
    ) -> CandleDecoration {
        let close_time = candle.close_time;
        let primary = self.primary_overlay_at(store, close_time);
        let is_highlighted = highlighted == Some(close_time);

        let marker = primary.map(|overlay| {
            let bias = overlay.bias();
            MarkerDecoration {
                kind: overlay.kind(),
                label: overlay.label(),
                bias,
                placement: bias.placement(),
                price: marker_price(candle, bias, offset),
                color: bias.color(),
            }
        });

        let stroke_color = if is_highlighted {
            Some(style::HIGHLIGHT_COLOR)
        } else {
            marker.as_ref().map(|m| m.color)
        };

        CandleDecoration {
            close_time,
            body_color: if candle.is_bullish() {
                style::BODY_UP_COLOR
            } else {
                style::BODY_DOWN_COLOR
            },
            stroke_color,
            stroke_width: if marker.is_some() {
                style::OVERLAY_STROKE_WIDTH
            } else {
                style::DEFAULT_STROKE_WIDTH
            },
            marker,
            signal_count: self.signals_at.get(&close_time).map_or(0, Vec::len),
            has_trend: self.trends_at.contains_key(&close_time),
            has_annotation: store.annotation(close_time).is_some(),
            marked: self.is_marked(close_time),
            highlighted: is_highlighted,
        }
    }

    /// Levels are not joined to candles; every window shows all of them.
    pub fn level_lines(&self, store: &OverlayStore) -> Vec<LevelLine> {
        store.levels().iter().map(LevelLine::from_level).collect()
    }

    fn first_trend_position(&self, close_time: i64) -> Option<usize> {
        self.trends_at
            .get(&close_time)
            .and_then(|positions| positions.first().copied())
    }
}
