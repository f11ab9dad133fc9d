//! Unit tests for analysis window alignment

use intone::timeline::{AnalysisWindow, FrequencyRange, GridConfig, Selection};

#[test]
fn unconstrained_window_moves_back_four_hops() {
    let grid = GridConfig::default();
    let window = grid.align(Selection::new(4096, 8192), FrequencyRange::unconstrained());
    assert_eq!(window, AnalysisWindow::new(3072, 7168));
}

#[test]
fn constrained_window_only_trims_the_tail() {
    let grid = GridConfig::default();
    let window = grid.align(
        Selection::new(4000, 10000),
        FrequencyRange::new(100.0, 400.0),
    );
    // 4000 -> 4096, 10000 -> 10240 - 9 * 256
    assert_eq!(window, AnalysisWindow::new(4096, 7936));
}

#[test]
fn short_early_selection_has_no_duration() {
    let grid = GridConfig::default();
    let window = grid.align(Selection::new(100, 1000), FrequencyRange::unconstrained());
    assert_eq!(window, AnalysisWindow::new(-768, 0));
    assert!(!window.has_duration(44100));
}

#[test]
fn window_start_is_not_clamped() {
    let grid = GridConfig::default();
    let window = grid.align(Selection::new(0, 4096), FrequencyRange::unconstrained());
    assert_eq!(window.start, -1024);
    assert!(window.has_duration(44100));
}

#[test]
fn custom_grid_is_respected() {
    let grid = GridConfig {
        size: 512,
        unconstrained_lag_hops: 1,
        constrained_tail_hops: 2,
    };
    let window = grid.align(Selection::new(600, 2000), FrequencyRange::unconstrained());
    assert_eq!(window, AnalysisWindow::new(512, 1536));
}

#[test]
fn window_seconds_use_sample_rate() {
    let window = AnalysisWindow::new(44100, 88200);
    assert_eq!(window.start_secs(44100), 1.0);
    assert_eq!(window.duration_secs(44100), 1.0);
}
