use super::*;

#[test]
fn before_the_window_progress_resets() {
    assert_eq!(on_scroll(0.0, 1000.0, 200.0, 400.0), ScrollProgress::RESET);
    assert_eq!(on_scroll(799.0, 1000.0, 200.0, 400.0), ScrollProgress::RESET);
    assert_eq!(on_scroll(f64::NAN, 1000.0, 200.0, 400.0), ScrollProgress::RESET);
}

#[test]
fn progress_is_eased_with_cubic_out() {
    let p = on_scroll(1000.0, 1000.0, 200.0, 400.0);
    assert_eq!(p.raw, 0.5);
    assert_eq!(p.eased, 0.875);

    let start = on_scroll(800.0, 1000.0, 200.0, 400.0);
    assert_eq!(start.raw, 0.0);
    assert_eq!(start.eased, 0.0);
}

#[test]
fn progress_saturates_past_the_window() {
    let p = on_scroll(5000.0, 1000.0, 200.0, 400.0);
    assert_eq!(p.raw, 1.0);
    assert_eq!(p.eased, 1.0);
}

#[test]
fn eased_never_leaves_unit_range() {
    for y in (0..3000).step_by(37) {
        let p = on_scroll(y as f64, 900.0, 150.0, 650.0);
        assert!((0.0..=1.0).contains(&p.raw));
        assert!((0.0..=1.0).contains(&p.eased));
        assert!(p.eased >= p.raw);
    }
}

#[test]
fn zero_duration_jumps_to_the_boundary() {
    assert_eq!(on_scroll(500.0, 500.0, 0.0, 0.0), ScrollProgress { raw: 1.0, eased: 1.0 });
    assert_eq!(on_scroll(499.0, 500.0, 0.0, 0.0), ScrollProgress::RESET);
    assert_eq!(on_scroll(600.0, 500.0, 0.0, -10.0).raw, 1.0);
}

#[test]
fn linear_ease_keeps_raw_progress() {
    let p = on_scroll_with(Ease::Linear, 300.0, 200.0, 0.0, 400.0);
    assert_eq!(p.raw, 0.25);
    assert_eq!(p.eased, 0.25);
}

#[test]
fn effect_mappings_follow_scroll() {
    let fx = ScrollEffects {
        factor: 0.5,
        fade_threshold: 400.0,
        base_height: 100.0,
    };
    assert_eq!(fx.translate_y(100.0), 50.0);
    assert_eq!(fx.translate_y(10_000.0), 200.0);
    assert_eq!(fx.height(100.0), 50.0);
    assert_eq!(fx.height(1_000.0), 0.0);
    assert_eq!(fx.opacity(0.0), 1.0);
    assert_eq!(fx.opacity(100.0), 0.75);
    assert_eq!(fx.opacity(800.0), 0.0);
}

#[test]
fn zero_fade_threshold_is_guarded() {
    let fx = ScrollEffects {
        factor: 0.5,
        fade_threshold: 0.0,
        base_height: 100.0,
    };
    assert_eq!(fx.opacity(0.0), 1.0);
    assert_eq!(fx.opacity(1.0), 0.0);
    assert_eq!(fx.translate_y(300.0), 0.0);
    for y in [0.0, 1.0, 1e9] {
        assert!(fx.opacity(y).is_finite());
        assert!(fx.translate_y(y).is_finite());
        assert!(fx.height(y).is_finite());
    }
}

#[test]
fn unbounded_factor_falls_back_to_zero_offsets() {
    let fx = ScrollEffects {
        factor: f64::INFINITY,
        fade_threshold: 400.0,
        base_height: 100.0,
    };
    assert_eq!(fx.translate_y(0.0), 0.0);
    assert_eq!(fx.translate_y(10.0), 0.0);
    assert_eq!(fx.height(10.0), 0.0);
}

#[test]
fn settings_frame_combines_all_mappings() {
    let settings = ScrollSettings::default();
    let frame = settings.frame(200.0, 500.0);
    assert_eq!(frame.scroll_y, 200.0);
    assert_eq!(frame.progress, on_scroll(200.0, 500.0, 300.0, 600.0));
    assert_eq!(frame.translate_y, settings.effects.translate_y(200.0));
    assert_eq!(frame.height, settings.effects.height(200.0));
    assert_eq!(frame.opacity, 0.5);
}
