//! Fixed-size "day" pages over the series, numbered newest first.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, warn};

use crate::config::{is_valid_date_format, ChartConfig};
use crate::constants::{events, style, window};
use crate::data::types::Candle;
use crate::error::{ChartError, ChartResult};

/// Page selector value: the whole series or one numbered page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Page(usize),
}

impl PageSelection {
    /// Map a raw selector value; `-1` is ALL.
    pub fn from_selector(value: i64) -> ChartResult<Self> {
        if value == window::ALL_PAGES {
            return Ok(PageSelection::All);
        }
        usize::try_from(value)
            .map(PageSelection::Page)
            .map_err(|_| ChartError::PageUnavailable {
                page: value,
                available: 0,
            })
    }

    pub fn selector_value(&self) -> i64 {
        match self {
            PageSelection::All => window::ALL_PAGES,
            PageSelection::Page(index) => *index as i64,
        }
    }
}

/// One page: `start..end` into the series, with its date label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl Page {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Entry of the page selector as offered to the operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageOption {
    pub value: i64,
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct WindowPartitioner {
    page_size: usize,
    date_format: String,
    offset: FixedOffset,
}

impl WindowPartitioner {
    /// Out-of-range offsets fall back to UTC and bad date patterns to the default.
    pub fn new(config: &ChartConfig) -> Self {
        let offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                warn!(
                    "[WINDOW] utc_offset_minutes {} out of range, using UTC",
                    config.utc_offset_minutes
                );
                Utc.fix()
            });

        let date_format = if is_valid_date_format(&config.date_format) {
            config.date_format.clone()
        } else {
            warn!(
                "[WINDOW] Invalid date_format {:?}, using {:?}",
                config.date_format,
                style::DEFAULT_DATE_FORMAT
            );
            style::DEFAULT_DATE_FORMAT.to_string()
        };

        Self {
            page_size: config.page_size,
            date_format,
            offset,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `floor(len / page_size)`; zero means pagination is not offered.
    pub fn available_pages(&self, len: usize) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        len / self.page_size
    }

    pub fn effective_page_size(&self, len: usize) -> usize {
        let available = self.available_pages(len);
        if available == 0 {
            return 0;
        }
        self.page_size.min(len.div_ceil(available))
    }

    /// Bounds of page `index`, or `None` when the page would be empty or inverted.
    pub fn page_bounds(&self, len: usize, index: usize) -> Option<(usize, usize)> {
        if index >= self.available_pages(len) {
            return None;
        }
        let size = self.effective_page_size(len);
        let span = size.checked_mul(index + 1)?;
        let start = len.saturating_sub(span);
        let end = len.min(start + size);

        if start >= len || end <= start {
            debug!(
                event = events::PAGE_SKIPPED,
                "[WINDOW] Page {} degenerate ({}..{} of {})",
                index,
                start,
                end,
                len
            );
            return None;
        }
        Some((start, end))
    }

    pub fn page(&self, series: &[Candle], index: usize) -> Option<Page> {
        let (start, end) = self.page_bounds(series.len(), index)?;
        let label = format!(
            "{} - {}",
            self.format_date(series[start].open_time),
            self.format_date(series[end - 1].close_time)
        );
        Some(Page {
            index,
            start,
            end,
            label,
        })
    }

    /// All non-degenerate pages, newest (page 0) first.
    pub fn partition(&self, series: &[Candle]) -> Vec<Page> {
        (0..self.available_pages(series.len()))
            .filter_map(|index| self.page(series, index))
            .collect()
    }

    /// Selector entries with ALL first; empty when the series is shorter than a page.
    pub fn selector_options(&self, series: &[Candle]) -> Vec<PageOption> {
        if self.available_pages(series.len()) == 0 {
            return Vec::new();
        }
        let mut options = vec![PageOption {
            value: window::ALL_PAGES,
            label: format!("All Data ({} points)", series.len()),
        }];
        options.extend(self.partition(series).into_iter().map(|page| PageOption {
            value: page.index as i64,
            label: page.label,
        }));
        options
    }

    /// Raw epoch milliseconds when the timestamp cannot be rendered.
    pub fn format_date(&self, epoch_ms: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp_millis(epoch_ms) else {
            return epoch_ms.to_string();
        };
        let mut out = String::new();
        match write!(
            out,
            "{}",
            utc.with_timezone(&self.offset).format(&self.date_format)
        ) {
            Ok(()) => out,
            Err(_) => epoch_ms.to_string(),
        }
    }
}
