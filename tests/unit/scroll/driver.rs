use super::*;
use crate::foundation::core::Rect;
use crate::host::element::MemoryElement;
use crate::scroll::progress::ScrollEffects;

fn settings() -> ScrollSettings {
    ScrollSettings {
        start_offset_px: 200.0,
        duration_px: 400.0,
        effects: ScrollEffects {
            factor: 0.5,
            fade_threshold: 400.0,
            base_height: 100.0,
        },
        ..ScrollSettings::default()
    }
}

#[test]
fn applies_once_on_attach_and_on_every_scroll() {
    let events = HostEvents::default();
    let hero = MemoryElement::new("hero", Rect::ZERO);
    let bar = MemoryElement::new("bar", Rect::ZERO);
    let targets = ScrollTargets {
        parallax: Some(hero.clone()),
        fade: Some(hero.clone()),
        collapse: Some(bar.clone()),
        section: Some(bar.clone()),
    };
    let driver = ScrollDriver::attach(&events, settings(), 1000.0, targets);

    assert_eq!(hero.style("transform").as_deref(), Some("translateY(0.00px)"));
    assert_eq!(hero.style("opacity").as_deref(), Some("1.000"));
    assert_eq!(bar.style("height").as_deref(), Some("100.00px"));
    assert_eq!(bar.style(PROGRESS_STYLE).as_deref(), Some("0.0000"));

    events.scroll_to(1000.0);
    assert_eq!(hero.style("transform").as_deref(), Some("translateY(200.00px)"));
    assert_eq!(hero.style("opacity").as_deref(), Some("0.000"));
    assert_eq!(bar.style("height").as_deref(), Some("0.00px"));
    assert_eq!(bar.style(PROGRESS_STYLE).as_deref(), Some("0.8750"));
    assert_eq!(driver.last_frame().progress.raw, 0.5);
}

#[test]
fn scrolling_back_above_the_trigger_resets_progress() {
    let events = HostEvents::default();
    let section = MemoryElement::new("section", Rect::ZERO);
    let driver = ScrollDriver::attach(
        &events,
        settings(),
        1000.0,
        ScrollTargets {
            section: Some(section.clone()),
            ..ScrollTargets::default()
        },
    );
    events.scroll_to(1500.0);
    assert_eq!(section.style(PROGRESS_STYLE).as_deref(), Some("1.0000"));
    events.scroll_to(100.0);
    assert_eq!(section.style(PROGRESS_STYLE).as_deref(), Some("0.0000"));
    assert_eq!(driver.last_frame().scroll_y, 100.0);
}

#[test]
fn moving_the_section_reapplies() {
    let events = HostEvents::default();
    events.scroll_to(600.0);
    let driver = ScrollDriver::attach(&events, settings(), 1000.0, ScrollTargets::default());
    assert_eq!(driver.last_frame().progress.raw, 0.0);
    driver.set_section_top(600.0);
    assert_eq!(driver.last_frame().progress.raw, 0.5);
}

#[test]
fn detach_stops_updates_and_drop_cleans_up() {
    let events = HostEvents::default();
    let hero = MemoryElement::new("hero", Rect::ZERO);
    let driver = ScrollDriver::attach(
        &events,
        settings(),
        0.0,
        ScrollTargets {
            fade: Some(hero.clone()),
            ..ScrollTargets::default()
        },
    );
    assert_eq!(events.listener_count(), 1);
    assert!(driver.detach());
    assert!(!driver.detach());
    events.scroll_to(200.0);
    assert_eq!(hero.style("opacity").as_deref(), Some("1.000"));

    let second = ScrollDriver::attach(&events, settings(), 0.0, ScrollTargets::default());
    assert_eq!(events.listener_count(), 1);
    drop(second);
    assert_eq!(events.listener_count(), 0);
}
