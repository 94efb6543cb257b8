//! ChartScope - inspection engine for a trading bot's decisions
//!
//! Indexes a candle series by close time, joins sparse overlay streams
//! (signals, levels, trend swings, annotations, markers) onto it, pages it
//! into fixed-size windows and tracks what the operator has selected.

pub mod api;
pub mod config;
pub mod constants;
pub mod data;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use config::{AppConfig, ChartConfig};
pub use data::store::{Collection, OverlayStore};
pub use data::types::{Action, Candle, Signal, SupportResistanceLevel, TrendDirection, ZoneTrend};
pub use engine::session::ChartSession;
pub use error::{ChartError, ChartResult};

#[cfg(test)]
mod test_support;
