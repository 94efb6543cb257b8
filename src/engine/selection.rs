//! What is currently selected on the chart.
//!
//! `Selection` is a plain value: every transition consumes the old state and
//! returns the new one, so it can be driven without a rendering host.

use super::overlay::{OverlayJoiner, PrimaryOverlay};
use crate::data::store::{OverlayHandle, OverlayStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Popup {
    Signal(OverlayHandle),
    Trend(OverlayHandle),
}

/// Observable state. An open popup wins over the highlight marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    TimestampHighlighted(i64),
    SignalPopupOpen(OverlayHandle),
    TrendPopupOpen(OverlayHandle),
}

/// Result of dispatching one click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No candle under the pointer.
    Ignored,
    OpenedSignal(OverlayHandle),
    OpenedTrend(OverlayHandle),
    /// Plain candle: highlighted, and the caller should re-centre on it.
    Highlighted(i64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    highlighted: Option<i64>,
    popup: Option<Popup>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match (self.popup, self.highlighted) {
            (Some(Popup::Signal(handle)), _) => SelectionState::SignalPopupOpen(handle),
            (Some(Popup::Trend(handle)), _) => SelectionState::TrendPopupOpen(handle),
            (None, Some(ts)) => SelectionState::TimestampHighlighted(ts),
            (None, None) => SelectionState::Idle,
        }
    }

    pub fn highlighted(&self) -> Option<i64> {
        self.highlighted
    }

    pub fn popup(&self) -> Option<Popup> {
        self.popup
    }

    /// Signal beats trend beats plain candle. Popups replace each other; the
    /// highlight is only overwritten by a plain-candle click.
    pub fn on_click(
        self,
        target: Option<i64>,
        joiner: &OverlayJoiner,
        store: &OverlayStore,
    ) -> (Self, ClickOutcome) {
        let Some(close_time) = target else {
            return (self, ClickOutcome::Ignored);
        };

        match joiner.primary_overlay_at(store, close_time) {
            Some(PrimaryOverlay::Signal { handle, .. }) => (
                Self {
                    popup: Some(Popup::Signal(handle)),
                    ..self
                },
                ClickOutcome::OpenedSignal(handle),
            ),
            Some(PrimaryOverlay::Trend { handle, .. }) => (
                Self {
                    popup: Some(Popup::Trend(handle)),
                    ..self
                },
                ClickOutcome::OpenedTrend(handle),
            ),
            None => (
                Self {
                    highlighted: Some(close_time),
                    popup: None,
                },
                ClickOutcome::Highlighted(close_time),
            ),
        }
    }

    /// Closing a popup keeps the highlight.
    pub fn close_popup(self) -> Self {
        Self {
            popup: None,
            ..self
        }
    }

    pub fn highlight(self, close_time: i64) -> Self {
        Self {
            highlighted: Some(close_time),
            ..self
        }
    }

    /// A fresh series invalidates the highlight; overlays (and popups) survive.
    pub fn on_series_load(self) -> Self {
        Self {
            highlighted: None,
            ..self
        }
    }

    /// Drop a popup whose element no longer exists.
    pub fn without_stale_popup(self, store: &OverlayStore) -> Self {
        let stale = match self.popup {
            Some(Popup::Signal(handle)) => store.resolve_signal(handle).is_none(),
            Some(Popup::Trend(handle)) => store.resolve_trend(handle).is_none(),
            None => false,
        };
        if stale {
            self.close_popup()
        } else {
            self
        }
    }
}
