//! Fixture builders shared by the unit tests.

use rust_decimal::Decimal;

use crate::data::types::*;

/// 2025-01-06 08:00:00 UTC
pub const BASE_TIME: i64 = 1_736_150_400_000;
pub const MINUTE: i64 = 60_000;

pub fn close_time(position: usize) -> i64 {
    BASE_TIME + (position as i64 + 1) * MINUTE - 1
}

pub fn candle_at(position: usize) -> Candle {
    let open_time = BASE_TIME + position as i64 * MINUTE;
    let base = 100 + (position % 7) as i64;
    Candle {
        open_time,
        close_time: close_time(position),
        open: Decimal::new(base, 0),
        high: Decimal::new(base + 10, 0),
        low: Decimal::new(base - 10, 0),
        close: Decimal::new(if position % 2 == 0 { base + 5 } else { base - 5 }, 0),
        volume: Decimal::new(15, 1),
        quote_volume: Decimal::ZERO,
        trades: 3,
        base_asset_volume: Decimal::ZERO,
        quote_asset_volume: Decimal::ZERO,
    }
}

/// `len` consecutive one-minute candles.
pub fn series(len: usize) -> Vec<Candle> {
    (0..len).map(candle_at).collect()
}

pub fn signal_at(action: Action, close_time: i64) -> Signal {
    let mut candlestick = candle_at(0);
    candlestick.open_time = close_time - MINUTE + 1;
    candlestick.close_time = close_time;
    Signal {
        action,
        state: TimeframeState::new(),
        candlestick,
    }
}

pub fn trend_at(direction: TrendDirection, ts: i64) -> ZoneTrend {
    ZoneTrend {
        direction,
        close: Decimal::new(100, 0),
        low: Decimal::new(95, 0),
        high: Decimal::new(105, 0),
        max_percentage_change: 2.0,
        current_retracement: 1.234,
        zone_swing_index: Some(7),
        start_zone_swing_index: None,
        end_zone_swing_index: None,
        support_resistance_touches: 2,
        timestamp_of_swing: ts,
    }
}

pub fn level(kind: LevelKind, price: i64, touches: u32) -> SupportResistanceLevel {
    SupportResistanceLevel {
        kind,
        price: Decimal::new(price, 0),
        touches,
    }
}
