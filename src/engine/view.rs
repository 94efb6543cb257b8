//! Display models handed to the rendering collaborator.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::overlay::{CandleDecoration, LevelLine};
use super::window::PageOption;
use crate::data::types::{Candle, DecisionVector, EnhancedAnnotation, Signal, ZoneTrend};

/// Payload of the open popup, resolved from its handle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PopupPayload<'a> {
    Signal { signal: &'a Signal },
    Trend(TrendDetails<'a>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendDetails<'a> {
    pub trend: &'a ZoneTrend,
    /// Percentages rounded for display, e.g. "2.00%".
    pub max_percentage_change: String,
    pub current_retracement: String,
}

impl<'a> TrendDetails<'a> {
    pub fn new(trend: &'a ZoneTrend) -> Self {
        Self {
            trend,
            max_percentage_change: format!("{:.2}%", trend.max_percentage_change),
            current_retracement: format!("{:.2}%", trend.current_retracement),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TooltipField {
    pub key: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeframeSummary {
    pub timeframe: String,
    pub fields: Vec<TooltipField>,
    /// Attributes left out beyond the display limit.
    pub hidden: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnhancedTooltip {
    pub timeframes: Vec<TimeframeSummary>,
    pub decision: Option<DecisionVector>,
}

impl EnhancedTooltip {
    /// `None` when the serialized state cannot be read; the caller falls back
    /// to the basic tooltip.
    pub fn from_annotation(
        close_time: i64,
        annotation: &EnhancedAnnotation,
        max_fields: usize,
    ) -> Option<Self> {
        let Some(state) = annotation.parsed_state() else {
            warn!("[TOOLTIP] Unreadable annotation state at {}", close_time);
            return None;
        };

        let timeframes = state
            .into_iter()
            .map(|(timeframe, value)| {
                let entries: Vec<(String, Value)> = match value {
                    Value::Object(bag) => bag.into_iter().collect(),
                    other => vec![("value".to_string(), other)],
                };
                let hidden = entries.len().saturating_sub(max_fields);
                let fields = entries
                    .into_iter()
                    .take(max_fields)
                    .map(|(key, value)| TooltipField { key, value })
                    .collect();
                TimeframeSummary {
                    timeframe,
                    fields,
                    hidden,
                }
            })
            .collect();

        Some(Self {
            timeframes,
            decision: annotation.decision.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tooltip {
    pub close_time: i64,
    pub position: usize,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub signal: Option<&'static str>,
    pub enhanced: Option<EnhancedTooltip>,
}

impl Tooltip {
    pub fn basic(candle: &Candle, position: usize, signal: Option<&'static str>) -> Self {
        Self {
            close_time: candle.close_time,
            position,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            signal,
            enhanced: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    pub total: usize,
    pub visible: usize,
}

/// Which window is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ViewMode {
    All,
    Page { index: usize, start: usize, end: usize },
    Located { target: i64, start: usize, end: usize },
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, Serialize)]
pub struct ViewSnapshot<'a> {
    pub mode: ViewMode,
    /// Selector value: -1 for ALL, the page index, or `None` while located.
    pub selected_page: Option<i64>,
    pub candles: &'a [Candle],
    pub decorations: Vec<CandleDecoration>,
    pub levels: Vec<LevelLine>,
    pub page_options: Vec<PageOption>,
    pub highlighted: Option<i64>,
    pub popup: Option<PopupPayload<'a>>,
    pub signals: SignalSummary,
}
