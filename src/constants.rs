//! Engine-wide constants and defaults
//!
//! Defaults here are only fallbacks for `config.yaml`; page size in particular
//! is a per-session setting.

/// Paging and windowing defaults
pub mod window {
    /// Candles per "day" page when the config omits it
    pub const DEFAULT_PAGE_SIZE: usize = 250;

    /// Selector value that shows the whole series unpartitioned
    pub const ALL_PAGES: i64 = -1;

    /// Candles kept on each side of a located timestamp
    pub const DEFAULT_LOCATE_RADIUS: usize = 50;
}

/// Colours and geometry handed to the renderer
pub mod style {
    pub const BULLISH_COLOR: &str = "#22c55e";
    pub const BEARISH_COLOR: &str = "#ef4444";

    /// Candle body colours
    pub const BODY_UP_COLOR: &str = "green";
    pub const BODY_DOWN_COLOR: &str = "red";

    /// Outline of the highlighted candle
    pub const HIGHLIGHT_COLOR: &str = "#ff00ff";

    pub const OVERLAY_STROKE_WIDTH: u32 = 3;
    pub const DEFAULT_STROKE_WIDTH: u32 = 1;

    /// Level line width is touches / 4, clamped to this range
    pub const LEVEL_MIN_WIDTH: f64 = 1.0;
    pub const LEVEL_MAX_WIDTH: f64 = 8.0;
    pub const TOUCHES_PER_WIDTH_STEP: f64 = 4.0;

    pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

    /// Tooltip shows at most this many attributes per timeframe
    pub const DEFAULT_TOOLTIP_MAX_FIELDS: usize = 6;
}

/// Logging event names for structured logging
pub mod events {
    pub const SERIES_LOADED: &str = "series_loaded";
    pub const SERIES_REJECTED: &str = "series_rejected";
    pub const OVERLAY_BATCH: &str = "overlay_batch";
    pub const OVERLAY_CLEARED: &str = "overlay_cleared";
    pub const PAGE_SELECTED: &str = "page_selected";
    pub const PAGE_SKIPPED: &str = "page_skipped";
    pub const LOOKUP_MISS: &str = "lookup_miss";
    pub const WINDOW_LOCATED: &str = "window_located";
    pub const POPUP_OPENED: &str = "popup_opened";
    pub const POPUP_STALE: &str = "popup_stale";
}
