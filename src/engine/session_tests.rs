//! Unit tests for ChartSession - load lifecycles, windowing, interaction.

#[cfg(test)]
mod session_tests {
    use crate::config::ChartConfig;
    use crate::data::store::Collection;
    use crate::data::types::*;
    use crate::engine::selection::{ClickOutcome, SelectionState};
    use crate::engine::session::ChartSession;
    use crate::engine::view::{PopupPayload, ViewMode};
    use crate::error::ChartError;
    use crate::test_support::*;
    use std::collections::BTreeMap;

    fn session() -> ChartSession {
        ChartSession::new(ChartConfig::default())
    }

    fn loaded(len: usize) -> ChartSession {
        let mut s = session();
        s.load_candles(series(len)).unwrap();
        s
    }

    // ============= Load Tests =============

    #[test]
    fn test_load_defaults_to_all() {
        let s = loaded(500);
        assert_eq!(s.mode(), ViewMode::All);
        assert_eq!(s.visible().len(), 500);
        assert_eq!(s.selected_page(), Some(-1));
        assert_eq!(s.position_of(close_time(42)), Some(42));
    }

    #[test]
    fn test_load_same_batch_twice_is_idempotent() {
        let mut s = loaded(300);
        let before: Vec<i64> = s.visible().iter().map(|c| c.close_time).collect();

        assert_eq!(s.load_candles(series(300)).unwrap(), 300);
        let after: Vec<i64> = s.visible().iter().map(|c| c.close_time).collect();

        assert_eq!(before, after);
        assert_eq!(s.series().len(), 300);
        assert_eq!(s.position_of(close_time(299)), Some(299));
    }

    #[test]
    fn test_rejected_load_keeps_previous_series() {
        let mut s = loaded(300);
        s.select_page(0).unwrap();

        let mut dupes = series(10);
        dupes[5].close_time = dupes[4].close_time;
        assert!(matches!(
            s.load_candles(dupes),
            Err(ChartError::DuplicateKey { .. })
        ));

        let mut unordered = series(10);
        unordered.reverse();
        assert!(matches!(
            s.load_candles(unordered),
            Err(ChartError::Structural { .. })
        ));

        assert_eq!(s.series().len(), 300);
        assert!(matches!(s.mode(), ViewMode::Page { index: 0, .. }));
    }

    #[test]
    fn test_new_load_resets_page_and_highlight() {
        let mut s = loaded(500);
        s.search(close_time(100)).unwrap();
        assert_eq!(s.highlighted(), Some(close_time(100)));

        s.load_candles(series(400)).unwrap();
        assert_eq!(s.mode(), ViewMode::All);
        assert_eq!(s.highlighted(), None);
    }

    // ============= Paging Tests =============

    #[test]
    fn test_500_candles_two_pages() {
        let mut s = loaded(500);
        assert_eq!(s.available_pages(), 2);

        let newest = s.select_page(0).unwrap();
        assert_eq!(newest.len(), 250);
        assert_eq!(newest[0].close_time, close_time(250));

        let oldest = s.select_page(1).unwrap();
        assert_eq!(oldest[0].close_time, close_time(0));
        assert_eq!(oldest.last().unwrap().close_time, close_time(249));

        assert_eq!(s.select_page(-1).unwrap().len(), 500);
    }

    #[test]
    fn test_select_unavailable_page() {
        let mut s = loaded(500);
        s.select_page(1).unwrap();

        assert!(matches!(
            s.select_page(2),
            Err(ChartError::PageUnavailable { page: 2, available: 2 })
        ));
        assert!(s.select_page(-5).is_err());
        // Previous page still shown
        assert!(matches!(s.mode(), ViewMode::Page { index: 1, .. }));
    }

    #[test]
    fn test_short_series_has_no_pagination() {
        let mut s = loaded(100);
        assert!(!s.pagination_enabled());
        assert!(s.page_options().is_empty());
        assert!(s.select_page(0).is_err());
        assert_eq!(s.select_page(-1).unwrap().len(), 100);
    }

    #[test]
    fn test_page_size_is_configurable() {
        let mut s = ChartSession::new(ChartConfig {
            page_size: 288,
            ..ChartConfig::default()
        });
        s.load_candles(series(1000)).unwrap();
        assert_eq!(s.available_pages(), 3);
        assert_eq!(s.pages()[0].len(), 288);
    }

    #[test]
    fn test_unvalidated_config_renders_labels() {
        let mut s = ChartSession::new(ChartConfig {
            page_size: 1,
            date_format: "%Q".to_string(),
            utc_offset_minutes: i32::MAX,
            ..ChartConfig::default()
        });
        s.load_candles(series(1)).unwrap();

        let options = s.page_options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].label, "06/01/2025 - 06/01/2025");
    }

    // ============= Search Tests =============

    #[test]
    fn test_search_hit_and_miss_around_1000() {
        let candles: Vec<Candle> = (1..=200)
            .map(|i| {
                let mut c = candle_at(i);
                c.open_time = i as i64 * 1000 - 999;
                c.close_time = i as i64 * 1000;
                c
            })
            .collect();
        let mut s = session();
        s.load_candles(candles).unwrap();
        s.add_signals(vec![signal_at(Action::Buy, 1000)]);

        let err = s.search(999).unwrap_err();
        assert!(err.is_lookup_miss());
        assert_eq!(s.mode(), ViewMode::All);
        assert_eq!(s.highlighted(), None);

        let window = s.search(1000).unwrap();
        assert_eq!(window.len(), 51);
        assert_eq!(window[0].close_time, 1000);
        assert_eq!(s.highlighted(), Some(1000));
    }

    #[test]
    fn test_search_miss_keeps_current_window() {
        let mut s = loaded(500);
        s.search(close_time(300)).unwrap();
        let before = s.mode();

        assert!(s.search(close_time(300) + 1).is_err());
        assert_eq!(s.mode(), before);
        assert_eq!(s.highlighted(), Some(close_time(300)));
    }

    #[test]
    fn test_page_selection_replaces_located_window() {
        let mut s = loaded(500);
        s.search(close_time(300)).unwrap();
        assert_eq!(s.selected_page(), None);
        assert_eq!(s.visible().len(), 101);

        s.select_page(0).unwrap();
        assert!(matches!(s.mode(), ViewMode::Page { index: 0, .. }));
        assert_eq!(s.selected_page(), Some(0));
    }

    // ============= Click Tests =============

    #[test]
    fn test_click_on_empty_chart_is_noop() {
        let mut s = session();
        s.add_signals(vec![signal_at(Action::Buy, close_time(0))]);

        assert_eq!(s.click(Some(close_time(0))), ClickOutcome::Ignored);
        assert_eq!(s.click(None), ClickOutcome::Ignored);
        assert_eq!(s.selection_state(), SelectionState::Idle);
    }

    #[test]
    fn test_click_signal_beats_trend() {
        let mut s = loaded(300);
        let ts = close_time(120);
        s.add_trends(vec![trend_at(TrendDirection::Up, ts)]);
        s.add_signals(vec![signal_at(Action::Sell, ts)]);

        assert!(matches!(s.click(Some(ts)), ClickOutcome::OpenedSignal(_)));
        match s.popup() {
            Some(PopupPayload::Signal { signal }) => assert_eq!(signal.action, Action::Sell),
            other => panic!("expected signal popup, got {:?}", other),
        }
        // Window untouched by popup clicks
        assert_eq!(s.mode(), ViewMode::All);
    }

    #[test]
    fn test_click_trend_popup_details() {
        let mut s = loaded(300);
        let ts = close_time(10);
        s.add_trends(vec![trend_at(TrendDirection::Down, ts)]);

        assert!(matches!(s.click(Some(ts)), ClickOutcome::OpenedTrend(_)));
        match s.popup() {
            Some(PopupPayload::Trend(details)) => {
                assert_eq!(details.trend.direction, TrendDirection::Down);
                assert_eq!(details.current_retracement, "1.23%");
                assert_eq!(details.max_percentage_change, "2.00%");
            }
            other => panic!("expected trend popup, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_click_highlights_and_rewindows() {
        let mut s = loaded(500);
        s.select_page(1).unwrap();
        let ts = close_time(200);

        assert_eq!(s.click(Some(ts)), ClickOutcome::Highlighted(ts));
        assert_eq!(s.highlighted(), Some(ts));
        assert_eq!(
            s.mode(),
            ViewMode::Located {
                target: ts,
                start: 150,
                end: 251
            }
        );
    }

    #[test]
    fn test_close_popup_keeps_highlight() {
        let mut s = loaded(300);
        s.add_signals(vec![signal_at(Action::Buy, close_time(50))]);
        s.search(close_time(40)).unwrap();
        s.click(Some(close_time(50)));

        s.close_popup();
        assert!(s.popup().is_none());
        assert_eq!(
            s.selection_state(),
            SelectionState::TimestampHighlighted(close_time(40))
        );
    }

    #[test]
    fn test_clearing_signals_invalidates_popup() {
        let mut s = loaded(300);
        s.add_signals(vec![signal_at(Action::Buy, close_time(50))]);
        s.click(Some(close_time(50)));
        assert!(s.popup().is_some());

        s.clear(Collection::Signals);
        assert!(s.popup().is_none());
        assert_eq!(s.selection_state(), SelectionState::Idle);

        // Next click on the same candle now just highlights
        assert_eq!(
            s.click(Some(close_time(50))),
            ClickOutcome::Highlighted(close_time(50))
        );
    }

    // ============= Overlay Lifecycle Tests =============

    #[test]
    fn test_overlay_batches_accumulate_and_markers_replace() {
        let mut s = loaded(300);
        assert_eq!(s.add_signals(vec![signal_at(Action::Buy, close_time(1))]), 1);
        assert_eq!(s.add_signals(vec![signal_at(Action::Buy, close_time(1))]), 2);
        assert_eq!(s.add_levels(vec![level(LevelKind::Support, 95, 4)]), 1);
        assert_eq!(s.replace_markers(vec![close_time(1), close_time(2)]), 2);
        assert_eq!(s.replace_markers(vec![close_time(3)]), 1);

        assert_eq!(s.overlays_at(close_time(1)).signals.len(), 2);
        assert!(!s.overlays_at(close_time(1)).marked);
        assert!(s.overlays_at(close_time(3)).marked);
    }

    #[test]
    fn test_clear_candles_keeps_overlays() {
        let mut s = loaded(300);
        s.add_signals(vec![signal_at(Action::Buy, close_time(1))]);
        s.clear(Collection::Candles);

        assert!(s.visible().is_empty());
        assert_eq!(s.store().signals().len(), 1);
        assert_eq!(s.click(Some(close_time(1))), ClickOutcome::Ignored);
    }

    #[test]
    fn test_signal_summary_counts_visible_window() {
        let mut s = loaded(500);
        s.add_signals(vec![
            signal_at(Action::Buy, close_time(10)),
            signal_at(Action::Sell, close_time(300)),
            signal_at(Action::Buy, close_time(499)),
            // Not in the series at all
            signal_at(Action::Buy, close_time(600)),
        ]);

        assert_eq!(s.signal_summary().total, 4);
        assert_eq!(s.signal_summary().visible, 3);

        s.select_page(0).unwrap();
        assert_eq!(s.signal_summary().visible, 2);
    }

    // ============= Tooltip / Snapshot Tests =============

    #[test]
    fn test_tooltip_with_enhanced_state() {
        let mut s = loaded(300);
        let ts = close_time(5);
        s.add_signals(vec![signal_at(Action::Buy, ts)]);
        let mut batch = BTreeMap::new();
        batch.insert(
            ts,
            EnhancedAnnotation {
                state: r#"{"1h":{"a":1,"b":2,"c":3,"d":4,"e":5,"f":6,"g":7,"h":8},"4h":{"x":true}}"#
                    .to_string(),
                decision: Some(DecisionVector {
                    buy: 0.7,
                    hold: 0.1,
                    sell: 0.1,
                    wait: 0.1,
                }),
            },
        );
        s.merge_annotations(batch);

        let tooltip = s.tooltip(ts).unwrap();
        assert_eq!(tooltip.position, 5);
        assert_eq!(tooltip.signal, Some("BUY"));

        let enhanced = tooltip.enhanced.unwrap();
        assert_eq!(enhanced.timeframes.len(), 2);
        assert_eq!(enhanced.timeframes[0].timeframe, "1h");
        assert_eq!(enhanced.timeframes[0].fields.len(), 6);
        assert_eq!(enhanced.timeframes[0].hidden, 2);
        assert_eq!(enhanced.timeframes[1].hidden, 0);
        assert_eq!(enhanced.decision.unwrap().buy, 0.7);
    }

    #[test]
    fn test_tooltip_falls_back_on_bad_state() {
        let mut s = loaded(300);
        let ts = close_time(5);
        let mut batch = BTreeMap::new();
        batch.insert(
            ts,
            EnhancedAnnotation {
                state: "oops".to_string(),
                decision: None,
            },
        );
        s.merge_annotations(batch);

        let tooltip = s.tooltip(ts).unwrap();
        assert!(tooltip.enhanced.is_none());
        assert_eq!(tooltip.signal, None);
        assert!(s.tooltip(ts + 1).is_err());
    }

    #[test]
    fn test_tooltip_enhanced_disabled() {
        let mut s = ChartSession::new(ChartConfig {
            show_enhanced_tooltip: false,
            ..ChartConfig::default()
        });
        s.load_candles(series(10)).unwrap();
        let mut batch = BTreeMap::new();
        batch.insert(
            close_time(1),
            EnhancedAnnotation {
                state: "{}".to_string(),
                decision: None,
            },
        );
        s.merge_annotations(batch);
        assert!(s.tooltip(close_time(1)).unwrap().enhanced.is_none());
    }

    #[test]
    fn test_snapshot_matches_visible_window() {
        let mut s = loaded(500);
        s.add_levels(vec![level(LevelKind::Resistance, 120, 9)]);
        s.add_signals(vec![signal_at(Action::Buy, close_time(300))]);
        s.search(close_time(300)).unwrap();

        let snapshot = s.snapshot();
        assert_eq!(snapshot.candles.len(), 101);
        assert_eq!(snapshot.decorations.len(), 101);
        assert_eq!(snapshot.levels.len(), 1);
        assert_eq!(snapshot.page_options.len(), 3);
        assert_eq!(snapshot.highlighted, Some(close_time(300)));
        assert_eq!(snapshot.selected_page, None);
        assert_eq!(snapshot.signals.visible, 1);

        let centre = &snapshot.decorations[50];
        assert!(centre.highlighted);
        assert!(centre.marker.is_some());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["mode"]["mode"], "located");
    }
}
