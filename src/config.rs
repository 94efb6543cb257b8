use chrono::format::{Item, StrftimeItems};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{style, window};
use crate::error::{ChartError, ChartResult};

fn default_page_size() -> usize {
    window::DEFAULT_PAGE_SIZE
}

fn default_locate_radius() -> usize {
    window::DEFAULT_LOCATE_RADIUS
}

fn default_marker_offset() -> Decimal {
    // 2% of the candle's high (or low)
    Decimal::new(2, 2)
}

fn default_date_format() -> String {
    style::DEFAULT_DATE_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_tooltip_max_fields() -> usize {
    style::DEFAULT_TOOLTIP_MAX_FIELDS
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChartConfig {
    /// Candles per "day" page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Candles on each side of a located timestamp
    #[serde(default = "default_locate_radius")]
    pub locate_radius: usize,

    /// Proportional distance of markers from the candle's high/low
    #[serde(default = "default_marker_offset")]
    pub marker_offset: Decimal,

    /// chrono format string used in page labels
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_true")]
    pub show_enhanced_tooltip: bool,

    #[serde(default = "default_tooltip_max_fields")]
    pub tooltip_max_fields: usize,
}

/// True when chrono can render `pattern` without a formatting error.
pub fn is_valid_date_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

impl ChartConfig {
    pub fn validate(&self) -> ChartResult<()> {
        if self.page_size == 0 {
            return Err(ChartError::Config("chart.page_size must be > 0".into()));
        }
        if self.marker_offset.is_sign_negative() || self.marker_offset >= Decimal::ONE {
            return Err(ChartError::Config(format!(
                "chart.marker_offset must be in [0, 1), got {}",
                self.marker_offset
            )));
        }
        if !is_valid_date_format(&self.date_format) {
            return Err(ChartError::Config(format!(
                "chart.date_format is not a valid strftime pattern: {:?}",
                self.date_format
            )));
        }
        if self.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(ChartError::Config(format!(
                "chart.utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            locate_radius: default_locate_radius(),
            marker_offset: default_marker_offset(),
            date_format: default_date_format(),
            utc_offset_minutes: 0,
            show_enhanced_tooltip: true,
            tooltip_max_fields: default_tooltip_max_fields(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chart: ChartConfig::default(),
            server: ServerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from `CHARTSCOPE_CONFIG` or `./config.yaml`. A missing file means defaults.
    pub fn load() -> ChartResult<Self> {
        let config_path =
            std::env::var("CHARTSCOPE_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        let path = Path::new(&config_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ChartError::Config(format!("failed to read {}: {}", config_path, e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ChartResult<Self> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| ChartError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ChartResult<()> {
        self.chart.validate()
    }
}
