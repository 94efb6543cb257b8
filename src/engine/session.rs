use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::locator::RangeLocator;
use super::overlay::{CandleDecoration, LevelLine, OverlayJoiner, OverlaysAt, PrimaryOverlay};
use super::selection::{ClickOutcome, Popup, Selection, SelectionState};
use super::series_index::{check_chronological, SeriesIndex};
use super::view::{
    EnhancedTooltip, PopupPayload, SignalSummary, Tooltip, TrendDetails, ViewMode, ViewSnapshot,
};
use super::window::{Page, PageOption, PageSelection, WindowPartitioner};
use crate::config::ChartConfig;
use crate::constants::events;
use crate::data::store::{Collection, OverlayStore};
use crate::data::types::{
    Candle, EnhancedAnnotation, Signal, SupportResistanceLevel, TimeMarker, ZoneTrend,
};
use crate::error::{ChartError, ChartResult};

/// One operator session: the loaded series, its overlays, the visible window
/// and the current selection. Every external input is one method call.
pub struct ChartSession {
    config: ChartConfig,
    series: Vec<Candle>,
    index: SeriesIndex,
    store: OverlayStore,
    joiner: OverlayJoiner,
    partitioner: WindowPartitioner,
    locator: RangeLocator,
    mode: ViewMode,
    selection: Selection,
}

impl ChartSession {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            partitioner: WindowPartitioner::new(&config),
            locator: RangeLocator::new(config.locate_radius),
            config,
            series: Vec::new(),
            index: SeriesIndex::default(),
            store: OverlayStore::new(),
            joiner: OverlayJoiner::default(),
            mode: ViewMode::All,
            selection: Selection::new(),
        }
    }

    // ---- loads ----

    /// Replace the series wholesale. Resets the view to ALL and drops the
    /// highlight. On error nothing changes.
    pub fn load_candles(&mut self, candles: Vec<Candle>) -> ChartResult<usize> {
        let index = SeriesIndex::build(&candles)
            .and_then(|index| check_chronological(&candles).map(|_| index))
            .inspect_err(|e| {
                warn!(event = events::SERIES_REJECTED, "⚠️ [SESSION] Candle batch rejected: {}", e)
            })?;

        self.series = candles;
        self.index = index;
        self.mode = ViewMode::All;
        self.selection = self.selection.on_series_load();

        info!(
            event = events::SERIES_LOADED,
            "📊 [SESSION] Loaded {} candles ({} pages of {})",
            self.series.len(),
            self.available_pages(),
            self.partitioner.page_size()
        );
        Ok(self.series.len())
    }

    pub fn add_signals(&mut self, batch: Vec<Signal>) -> usize {
        let added = batch.len();
        self.store.append_signals(batch);
        self.rebuild_joiner(Collection::Signals, added);
        self.store.signals().len()
    }

    pub fn add_levels(&mut self, batch: Vec<SupportResistanceLevel>) -> usize {
        let added = batch.len();
        self.store.append_levels(batch);
        self.rebuild_joiner(Collection::Levels, added);
        self.store.levels().len()
    }

    pub fn add_trends(&mut self, batch: Vec<ZoneTrend>) -> usize {
        let added = batch.len();
        self.store.append_trends(batch);
        self.rebuild_joiner(Collection::Trends, added);
        self.store.trends().len()
    }

    pub fn merge_annotations(&mut self, batch: BTreeMap<i64, EnhancedAnnotation>) -> usize {
        let added = batch.len();
        self.store.merge_annotations(batch);
        self.rebuild_joiner(Collection::Annotations, added);
        self.store.annotations().len()
    }

    pub fn replace_markers(&mut self, batch: Vec<TimeMarker>) -> usize {
        let added = batch.len();
        self.store.replace_markers(batch);
        self.rebuild_joiner(Collection::Markers, added);
        self.store.markers().len()
    }

    /// Empty one collection, leaving the others alone.
    pub fn clear(&mut self, collection: Collection) {
        match collection {
            Collection::Candles => {
                self.series.clear();
                self.index = SeriesIndex::default();
                self.mode = ViewMode::All;
                self.selection = self.selection.on_series_load();
                info!(event = events::OVERLAY_CLEARED, "🧹 [SESSION] Cleared candles");
            }
            other => {
                self.store.clear(other);
                self.joiner = OverlayJoiner::build(&self.store);
                self.selection = self.selection.without_stale_popup(&self.store);
            }
        }
    }

    fn rebuild_joiner(&mut self, collection: Collection, added: usize) {
        self.joiner = OverlayJoiner::build(&self.store);
        info!(
            event = events::OVERLAY_BATCH,
            "➕ [SESSION] {} batch of {} applied",
            collection,
            added
        );
    }

    // ---- windowing ----

    pub fn available_pages(&self) -> usize {
        self.partitioner.available_pages(self.series.len())
    }

    /// False when the series is shorter than one page; no selector is offered.
    pub fn pagination_enabled(&self) -> bool {
        self.available_pages() > 0
    }

    pub fn pages(&self) -> Vec<Page> {
        self.partitioner.partition(&self.series)
    }

    pub fn page_options(&self) -> Vec<PageOption> {
        self.partitioner.selector_options(&self.series)
    }

    /// Switch to ALL or one page. Leaves any located window behind.
    pub fn select_page(&mut self, value: i64) -> ChartResult<&[Candle]> {
        let available = self.available_pages();
        let mode = match PageSelection::from_selector(value) {
            Ok(PageSelection::All) => ViewMode::All,
            Ok(PageSelection::Page(index)) => {
                let (start, end) = self
                    .partitioner
                    .page_bounds(self.series.len(), index)
                    .ok_or(ChartError::PageUnavailable {
                        page: value,
                        available,
                    })?;
                ViewMode::Page { index, start, end }
            }
            Err(_) => {
                return Err(ChartError::PageUnavailable {
                    page: value,
                    available,
                })
            }
        };

        self.mode = mode;
        info!(event = events::PAGE_SELECTED, "📅 [SESSION] Page {} selected", value);
        Ok(self.visible())
    }

    /// Centre the view on `close_time` and highlight it. A miss changes nothing.
    pub fn search(&mut self, close_time: i64) -> ChartResult<&[Candle]> {
        let located = self
            .locator
            .locate(&self.index, self.series.len(), close_time)
            .inspect_err(|e| warn!(event = events::LOOKUP_MISS, "🔍 [LOCATE] {}", e))?;

        self.mode = ViewMode::Located {
            target: located.target,
            start: located.start,
            end: located.end,
        };
        self.selection = self.selection.highlight(close_time);
        info!(
            event = events::WINDOW_LOCATED,
            "🔍 [LOCATE] {} at position {} ({} candles)",
            close_time,
            located.position,
            located.len()
        );
        Ok(self.visible())
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Selector value for the current mode; `None` while a located window is shown.
    pub fn selected_page(&self) -> Option<i64> {
        match self.mode {
            ViewMode::All => Some(PageSelection::All.selector_value()),
            ViewMode::Page { index, .. } => Some(PageSelection::Page(index).selector_value()),
            ViewMode::Located { .. } => None,
        }
    }

    pub fn visible(&self) -> &[Candle] {
        &self.series[self.visible_range()]
    }

    // ---- interaction ----

    /// Dispatch a click on the candle with `target` close time, if any.
    /// With no candles loaded this is a no-op.
    pub fn click(&mut self, target: Option<i64>) -> ClickOutcome {
        if self.series.is_empty() {
            return ClickOutcome::Ignored;
        }

        let current = self.selection.without_stale_popup(&self.store);
        let (next, outcome) = current.on_click(target, &self.joiner, &self.store);
        self.selection = next;

        match outcome {
            ClickOutcome::OpenedSignal(_) | ClickOutcome::OpenedTrend(_) => {
                debug!(event = events::POPUP_OPENED, "[SESSION] {:?}", outcome);
            }
            ClickOutcome::Highlighted(close_time) => {
                if let Ok(located) = self.locator.locate(&self.index, self.series.len(), close_time) {
                    self.mode = ViewMode::Located {
                        target: located.target,
                        start: located.start,
                        end: located.end,
                    };
                } else {
                    debug!("[SESSION] Clicked {} is not in the series; window kept", close_time);
                }
            }
            ClickOutcome::Ignored => {}
        }
        outcome
    }

    pub fn close_popup(&mut self) {
        self.selection = self.selection.close_popup();
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn highlighted(&self) -> Option<i64> {
        self.selection.highlighted()
    }

    /// Open popup, or `None` if closed or its element was cleared.
    pub fn popup(&self) -> Option<PopupPayload<'_>> {
        match self.selection.popup()? {
            Popup::Signal(handle) => match self.store.resolve_signal(handle) {
                Some(signal) => Some(PopupPayload::Signal { signal }),
                None => {
                    debug!(event = events::POPUP_STALE, "[SESSION] Signal popup is stale");
                    None
                }
            },
            Popup::Trend(handle) => match self.store.resolve_trend(handle) {
                Some(trend) => Some(PopupPayload::Trend(TrendDetails::new(trend))),
                None => {
                    debug!(event = events::POPUP_STALE, "[SESSION] Trend popup is stale");
                    None
                }
            },
        }
    }

    // ---- lookups and render outputs ----

    pub fn position_of(&self, close_time: i64) -> Option<usize> {
        self.index.position_of(close_time)
    }

    pub fn overlays_at(&self, close_time: i64) -> OverlaysAt<'_> {
        self.joiner.overlays_at(&self.store, close_time)
    }

    pub fn primary_overlay_at(&self, close_time: i64) -> Option<PrimaryOverlay<'_>> {
        self.joiner.primary_overlay_at(&self.store, close_time)
    }

    pub fn decorations(&self) -> Vec<CandleDecoration> {
        let highlighted = self.selection.highlighted();
        self.visible()
            .iter()
            .map(|candle| {
                self.joiner
                    .decorate(&self.store, candle, highlighted, self.config.marker_offset)
            })
            .collect()
    }

    pub fn level_lines(&self) -> Vec<LevelLine> {
        self.joiner.level_lines(&self.store)
    }

    pub fn signal_summary(&self) -> SignalSummary {
        let range = self.visible_range();
        let visible = self
            .store
            .signals()
            .iter()
            .filter(|signal| {
                self.index
                    .position_of(signal.close_time())
                    .is_some_and(|p| range.contains(&p))
            })
            .count();
        SignalSummary {
            total: self.store.signals().len(),
            visible,
        }
    }

    pub fn tooltip(&self, close_time: i64) -> ChartResult<Tooltip> {
        let position = self
            .index
            .position_of(close_time)
            .ok_or(ChartError::LookupMiss {
                timestamp: close_time,
            })?;
        let candle = &self.series[position];
        let signal = self
            .joiner
            .overlays_at(&self.store, close_time)
            .signals
            .first()
            .map(|s| s.action.as_str());

        let mut tooltip = Tooltip::basic(candle, position, signal);
        if self.config.show_enhanced_tooltip {
            tooltip.enhanced = self.store.annotation(close_time).and_then(|annotation| {
                EnhancedTooltip::from_annotation(close_time, annotation, self.config.tooltip_max_fields)
            });
        }
        Ok(tooltip)
    }

    pub fn snapshot(&self) -> ViewSnapshot<'_> {
        ViewSnapshot {
            mode: self.mode,
            selected_page: self.selected_page(),
            candles: self.visible(),
            decorations: self.decorations(),
            levels: self.level_lines(),
            page_options: self.page_options(),
            highlighted: self.highlighted(),
            popup: self.popup(),
            signals: self.signal_summary(),
        }
    }

    pub fn series(&self) -> &[Candle] {
        &self.series
    }

    pub fn store(&self) -> &OverlayStore {
        &self.store
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    fn visible_range(&self) -> std::ops::Range<usize> {
        match self.mode {
            ViewMode::All => 0..self.series.len(),
            ViewMode::Page { start, end, .. } | ViewMode::Located { start, end, .. } => start..end,
        }
    }
}
