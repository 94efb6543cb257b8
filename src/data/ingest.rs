//! Input boundary: turns already-decoded JSON payloads into typed batches.
//!
//! A batch is validated as a whole. Any bad element rejects the entire batch
//! so that the session never sees a partial load.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{
    Action, Candle, EnhancedAnnotation, Signal, SupportResistanceLevel, TimeMarker,
    TimeframeState, ZoneTrend,
};
use crate::error::{ChartError, ChartResult};

/// Signal payload without its action, as carried by the keyed legacy shape.
#[derive(Deserialize)]
struct SignalBody {
    #[serde(default)]
    state: TimeframeState,
    candlestick: Candle,
}

/// Older producers wrote `{"BUY": {...}}` or `{"SELL": {...}}`.
#[derive(Deserialize)]
struct KeyedSignal {
    #[serde(rename = "BUY")]
    buy: Option<SignalBody>,
    #[serde(rename = "SELL")]
    sell: Option<SignalBody>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSignal {
    Tagged(Signal),
    Keyed(KeyedSignal),
}

impl RawSignal {
    fn normalize(self, position: usize) -> ChartResult<Signal> {
        match self {
            RawSignal::Tagged(signal) => Ok(signal),
            RawSignal::Keyed(KeyedSignal { buy, sell }) => {
                let (action, body) = match (buy, sell) {
                    (Some(body), None) => (Action::Buy, body),
                    (None, Some(body)) => (Action::Sell, body),
                    (Some(_), Some(_)) => {
                        return Err(ChartError::structural(format!(
                            "signal #{}: carries both BUY and SELL",
                            position
                        )))
                    }
                    (None, None) => {
                        return Err(ChartError::structural(format!(
                            "signal #{}: expected {{action, state, candlestick}} or {{BUY|SELL: {{state, candlestick}}}}",
                            position
                        )))
                    }
                };
                Ok(Signal {
                    action,
                    state: body.state,
                    candlestick: body.candlestick,
                })
            }
        }
    }
}

fn array_items<'a>(value: &'a Value, what: &str) -> ChartResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ChartError::structural(format!("{} batch must be an array", what)))
}

fn parse_array<T: DeserializeOwned>(value: &Value, what: &str) -> ChartResult<Vec<T>> {
    array_items(value, what)?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            T::deserialize(item)
                .map_err(|e| ChartError::structural(format!("{} #{}: {}", what, i, e)))
        })
        .collect()
}

/// Candle batch. Each candle must open before it closes; ordering and
/// uniqueness are checked when the series index is built.
pub fn parse_candles(value: &Value) -> ChartResult<Vec<Candle>> {
    let candles: Vec<Candle> = parse_array(value, "candle")?;
    for (i, candle) in candles.iter().enumerate() {
        if candle.open_time >= candle.close_time {
            return Err(ChartError::structural(format!(
                "candle #{}: openTime {} is not before closeTime {}",
                i, candle.open_time, candle.close_time
            )));
        }
    }
    debug!("[INGEST] Parsed {} candles", candles.len());
    Ok(candles)
}

/// Signal batch, either an array or an object keyed by close time.
/// Both element shapes are normalized to [`Signal`].
pub fn parse_signals(value: &Value) -> ChartResult<Vec<Signal>> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => {
            return Err(ChartError::structural(
                "signal batch must be an array or an object of signals",
            ))
        }
    };

    let signals = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            RawSignal::deserialize(item)
                .map_err(|_| {
                    ChartError::structural(format!(
                        "signal #{}: expected {{action, state, candlestick}} or {{BUY|SELL: {{state, candlestick}}}}",
                        i
                    ))
                })
                .and_then(|raw| raw.normalize(i))
        })
        .collect::<ChartResult<Vec<Signal>>>()?;

    debug!("[INGEST] Parsed {} signals", signals.len());
    Ok(signals)
}

pub fn parse_levels(value: &Value) -> ChartResult<Vec<SupportResistanceLevel>> {
    parse_array(value, "support/resistance level")
}

pub fn parse_trends(value: &Value) -> ChartResult<Vec<ZoneTrend>> {
    parse_array(value, "zone trend")
}

/// Annotation batch: object keyed by close time (as a string).
pub fn parse_annotations(value: &Value) -> ChartResult<BTreeMap<i64, EnhancedAnnotation>> {
    let map = value.as_object().ok_or_else(|| {
        ChartError::structural("annotation batch must be an object keyed by closeTime")
    })?;

    let mut annotations = BTreeMap::new();
    for (key, item) in map {
        let close_time: i64 = key.trim().parse().map_err(|_| {
            ChartError::structural(format!("annotation key {:?} is not an epoch timestamp", key))
        })?;
        let annotation = EnhancedAnnotation::deserialize(item)
            .map_err(|e| ChartError::structural(format!("annotation {}: {}", key, e)))?;

        if let Some(decision) = &annotation.decision {
            for (label, weight) in decision.weights() {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ChartError::structural(format!(
                        "annotation {}: decision weight {} is {}",
                        key, label, weight
                    )));
                }
            }
        }
        annotations.insert(close_time, annotation);
    }
    Ok(annotations)
}

pub fn parse_markers(value: &Value) -> ChartResult<Vec<TimeMarker>> {
    parse_array(value, "time marker")
}
