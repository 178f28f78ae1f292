use super::*;
use crate::foundation::core::Rect;
use crate::host::element::MemoryElement;

fn desktop() -> HostEvents {
    HostEvents::new(
        Viewport {
            width: 1440.0,
            height: 900.0,
            scroll_y: 0.0,
        },
        Capabilities::default(),
    )
}

#[test]
fn follower_moves_ten_percent_per_frame() {
    let mut f = MouseFollower::new(FollowerSettings::default(), Viewport::default(), Capabilities::default());
    f.on_pointer(100.0, 200.0);
    let p = f.step();
    assert!((p.x - 10.0).abs() < 1e-9);
    assert!((p.y - 20.0).abs() < 1e-9);
    let p = f.step();
    assert!((p.x - 19.0).abs() < 1e-9);
    for _ in 0..200 {
        f.step();
    }
    assert!((f.position().x - 100.0).abs() < 1e-6);
}

#[test]
fn sizes_scale_with_narrow_viewports() {
    let wide = MouseFollower::new(FollowerSettings::default(), Viewport::default(), Capabilities::default());
    assert_eq!(wide.sizes(), (200.0, 300.0));

    let mut f = wide.clone();
    f.on_resize(900.0, false);
    assert_eq!(f.sizes(), (150.0, 225.0));
    assert!(f.is_visible());
}

#[test]
fn mobile_and_touch_hide_the_follower() {
    let mut f = MouseFollower::new(FollowerSettings::default(), Viewport::default(), Capabilities::default());
    f.on_resize(768.0, false);
    assert!(!f.is_visible());
    f.on_pointer(50.0, 50.0);
    f.step();
    assert_eq!(f.position(), Point::ZERO);

    f.on_resize(1440.0, true);
    assert!(!f.is_visible());
}

#[test]
fn transform_centres_on_position() {
    let mut f = MouseFollower::new(FollowerSettings::default(), Viewport::default(), Capabilities::default());
    assert_eq!(f.transform(), "translate3d(-100px, -100px, 0)");
    f.set_hovering(true);
    assert!(f.background().contains("82, 130, 255"));
}

#[test]
fn driver_runs_frames_and_follows_pointer() {
    let events = desktop();
    let scheduler = Scheduler::new();
    let el = MemoryElement::new("follower", Rect::ZERO);
    let driver = FollowerDriver::attach(&events, &scheduler, el.clone(), FollowerSettings::default());

    assert_eq!(el.style("display").as_deref(), Some("block"));
    assert_eq!(el.style(SIZE_STYLE).as_deref(), Some("200px"));
    assert!(driver.is_running());

    events.pointer_move(1000.0, 0.0);
    scheduler.advance(Millis(16));
    assert!((driver.position().x - 100.0).abs() < 1e-9);
    assert!(el.style("transform").is_some());

    driver.set_hovering(true);
    assert_eq!(el.style(EXPANDED_STYLE).as_deref(), Some("1"));
    driver.set_hovering(false);
    assert_eq!(el.style(EXPANDED_STYLE), None);
}

#[test]
fn driver_hides_on_mobile_resize_and_resumes() {
    let events = desktop();
    let scheduler = Scheduler::new();
    let el = MemoryElement::new("follower", Rect::ZERO);
    let driver = FollowerDriver::attach(&events, &scheduler, el.clone(), FollowerSettings::default());

    events.resize(600.0, 800.0);
    assert_eq!(el.style("display").as_deref(), Some("none"));
    assert!(!driver.is_running());
    assert_eq!(scheduler.pending(), 0);

    events.resize(1000.0, 800.0);
    assert_eq!(el.style("display").as_deref(), Some("block"));
    assert_eq!(el.style(SIZE_STYLE).as_deref(), Some("167px"));
    assert!(driver.is_running());
}

#[test]
fn detach_cancels_frame_loop() {
    let events = desktop();
    let scheduler = Scheduler::new();
    let el = MemoryElement::new("follower", Rect::ZERO);
    let driver = FollowerDriver::attach(&events, &scheduler, el, FollowerSettings::default());
    driver.detach();
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(events.listener_count(), 0);
    assert_eq!(scheduler.run_until_idle(), 0);
}

#[test]
fn touch_devices_never_start_the_loop() {
    let events = HostEvents::new(
        Viewport::default(),
        Capabilities {
            resize_observer: true,
            touch: true,
        },
    );
    let scheduler = Scheduler::new();
    let el = MemoryElement::new("follower", Rect::ZERO);
    let driver = FollowerDriver::attach(&events, &scheduler, el.clone(), FollowerSettings::default());
    assert_eq!(el.style("display").as_deref(), Some("none"));
    assert!(!driver.is_running());
}
