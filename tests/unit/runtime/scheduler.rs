use super::*;
use std::cell::RefCell;
use std::rc::Rc;

fn recorder() -> (Rc<RefCell<Vec<(u64, &'static str)>>>, Scheduler) {
    (Rc::new(RefCell::new(Vec::new())), Scheduler::new())
}

#[test]
fn timers_fire_in_deadline_then_insertion_order() {
    let (log, s) = recorder();
    for (delay, name) in [(30, "c"), (10, "a"), (10, "b")] {
        let log = Rc::clone(&log);
        let s2 = s.clone();
        s.set_timeout(Millis(delay), move || log.borrow_mut().push((s2.now().0, name)));
    }
    assert_eq!(s.advance(Millis(100)), 3);
    assert_eq!(*log.borrow(), vec![(10, "a"), (10, "b"), (30, "c")]);
    assert_eq!(s.now(), Millis(100));
}

#[test]
fn zero_delay_is_not_synchronous() {
    let (log, s) = recorder();
    let l = Rc::clone(&log);
    s.set_timeout(Millis::ZERO, move || l.borrow_mut().push((0, "zero")));
    assert!(log.borrow().is_empty());
    s.advance(Millis::ZERO);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn cleared_timers_never_fire() {
    let (log, s) = recorder();
    let l = Rc::clone(&log);
    let id = s.set_timeout(Millis(5), move || l.borrow_mut().push((5, "x")));
    assert!(s.is_pending(id));
    assert!(s.clear_timeout(id));
    assert!(!s.clear_timeout(id));
    s.run_until_idle();
    assert!(log.borrow().is_empty());
}

#[test]
fn tasks_can_schedule_follow_ups_within_the_same_advance() {
    let (log, s) = recorder();
    let l = Rc::clone(&log);
    let s2 = s.clone();
    s.set_timeout(Millis(10), move || {
        let l2 = Rc::clone(&l);
        let s3 = s2.clone();
        s2.set_timeout(Millis(10), move || l2.borrow_mut().push((s3.now().0, "chained")));
    });
    s.advance(Millis(25));
    assert_eq!(*log.borrow(), vec![(20, "chained")]);
}

#[test]
fn advance_stops_at_target() {
    let (log, s) = recorder();
    let l = Rc::clone(&log);
    s.set_timeout(Millis(50), move || l.borrow_mut().push((50, "late")));
    s.advance(Millis(49));
    assert!(log.borrow().is_empty());
    assert_eq!(s.next_due(), Some(Millis(50)));
    s.advance(Millis(1));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn run_until_idle_jumps_the_clock() {
    let s = Scheduler::new();
    s.set_timeout(Millis(1_000), || {});
    assert_eq!(s.run_until_idle(), 1);
    assert_eq!(s.now(), Millis(1_000));
    assert_eq!(s.pending(), 0);
}
