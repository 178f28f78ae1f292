use super::*;
use crate::host::events::{Capabilities, Viewport};

fn mobile_hub() -> HostEvents {
    HostEvents::new(
        Viewport {
            width: 390.0,
            height: 844.0,
            scroll_y: 0.0,
        },
        Capabilities::default(),
    )
}

#[test]
fn opens_only_on_mobile_wide_viewports() {
    let hub = HostEvents::default();
    let lock = ScrollLock::new(hub.clone());
    let menu = MenuOverlay::new(hub.clone(), lock.clone(), 1024.0);
    assert!(!menu.set_active(true));
    assert!(!lock.is_locked());

    hub.resize(800.0, 600.0);
    assert!(menu.set_active(true));
    assert!(lock.is_locked());
    assert!(!menu.set_active(false));
    assert!(!lock.is_locked());
}

#[test]
fn growing_past_breakpoint_closes_and_unlocks() {
    let hub = mobile_hub();
    let lock = ScrollLock::new(hub.clone());
    let menu = MenuOverlay::new(hub.clone(), lock.clone(), 1024.0);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen2 = Rc::clone(&seen);
    menu.subscribe(move |v| seen2.borrow_mut().push(*v));

    menu.set_active(true);
    hub.resize(1280.0, 800.0);
    assert!(!menu.is_active());
    assert!(!lock.is_locked());
    assert_eq!(*seen.borrow(), vec![false, true, false]);
}

#[test]
fn menu_release_keeps_other_holders_locked() {
    let hub = mobile_hub();
    let lock = ScrollLock::new(hub.clone());
    let menu = MenuOverlay::new(hub.clone(), lock.clone(), 1024.0);
    let contact = lock.acquire("contact-overlay");
    menu.set_active(true);
    menu.set_active(false);
    assert!(lock.is_locked());
    drop(contact);
    assert!(!lock.is_locked());
}

#[test]
fn detach_removes_listener_and_hold() {
    let hub = mobile_hub();
    let lock = ScrollLock::new(hub.clone());
    let mut menu = MenuOverlay::new(hub.clone(), lock.clone(), 1024.0);
    menu.set_active(true);
    assert_eq!(hub.listener_count(), 1);
    menu.detach();
    assert_eq!(hub.listener_count(), 0);
    assert!(!lock.is_locked());
}
