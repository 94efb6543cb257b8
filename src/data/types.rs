use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One OHLCV bar. `close_time` is the join key for every overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default)]
    pub quote_volume: Decimal,
    #[serde(default)]
    pub trades: u64,
    #[serde(default)]
    pub base_asset_volume: Decimal,
    #[serde(default)]
    pub quote_asset_volume: Decimal,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.open < self.close
    }
}

/// Attribute bag of one timeframe. Opaque to the engine.
pub type StateBag = Map<String, Value>;

/// Timeframe label ("1h", "4h", ...) to its attribute bag.
pub type TimeframeState = BTreeMap<String, StateBag>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        }
    }

    pub fn bias(&self) -> Bias {
        match self {
            Action::Buy => Bias::Bullish,
            Action::Sell => Bias::Bearish,
        }
    }
}

/// A bot decision pinned to the candle it was taken on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: Action,
    #[serde(default)]
    pub state: TimeframeState,
    /// Only its `close_time` is used for joining.
    pub candlestick: Candle,
}

impl Signal {
    pub fn close_time(&self) -> i64 {
        self.candlestick.close_time
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
}

impl LevelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKind::Support => "support",
            LevelKind::Resistance => "resistance",
        }
    }
}

/// Horizontal price reference; applies to whatever window is visible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportResistanceLevel {
    #[serde(rename = "type")]
    pub kind: LevelKind,
    pub price: Decimal,
    pub touches: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "UP",
            TrendDirection::Down => "DOWN",
        }
    }

    pub fn bias(&self) -> Bias {
        match self {
            TrendDirection::Up => Bias::Bullish,
            TrendDirection::Down => Bias::Bearish,
        }
    }
}

/// Swing event reported by the trend detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTrend {
    pub direction: TrendDirection,
    pub close: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub max_percentage_change: f64,
    pub current_retracement: f64,
    /// Index into the detector's own zone numbering, not into the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_swing_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_zone_swing_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_zone_swing_index: Option<i64>,
    #[serde(default)]
    pub support_resistance_touches: u32,
    pub timestamp_of_swing: i64,
}

/// Probability-like weights per decision; never normalized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct DecisionVector {
    #[serde(default)]
    pub buy: f64,
    #[serde(default)]
    pub hold: f64,
    #[serde(default)]
    pub sell: f64,
    #[serde(default)]
    pub wait: f64,
}

impl DecisionVector {
    pub fn weights(&self) -> [(&'static str, f64); 4] {
        [
            ("BUY", self.buy),
            ("HOLD", self.hold),
            ("SELL", self.sell),
            ("WAIT", self.wait),
        ]
    }
}

/// Per-candle diagnostic payload, keyed by close time in the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnhancedAnnotation {
    /// Serialized diagnostic state; parsed only for display.
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<DecisionVector>,
}

impl EnhancedAnnotation {
    /// Timeframe view of `state`, or `None` when it is not a JSON object.
    pub fn parsed_state(&self) -> Option<Map<String, Value>> {
        match serde_json::from_str::<Value>(&self.state) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

/// Bare epoch-millisecond mark with no payload.
pub type TimeMarker = i64;

/// Colour family of a marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
}
