use super::*;
use crate::contact::transport::{SendCallback, SimulatedTransport};
use crate::foundation::error::FolioError;
use crate::host::events::HostEvents;
use std::cell::Cell;

struct Rig {
    scheduler: Scheduler,
    events: HostEvents,
    lock: ScrollLock,
    transport: SimulatedTransport,
    machine: ContactSubmission,
    log: Rc<RefCell<Vec<SubmissionStatus>>>,
}

fn rig() -> Rig {
    let scheduler = Scheduler::new();
    let events = HostEvents::default();
    let lock = ScrollLock::new(events.clone());
    let transport = SimulatedTransport::new(scheduler.clone(), Millis(1000));
    let machine = ContactSubmission::new(
        scheduler.clone(),
        Rc::new(transport.clone()),
        lock.clone(),
        SubmissionTiming::default(),
    );
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    machine.subscribe(move |s| sink.borrow_mut().push(*s));
    Rig {
        scheduler,
        events,
        lock,
        transport,
        machine,
        log,
    }
}

fn form() -> ContactForm {
    ContactForm::new("Ada", "ada@example.org", "Hello there, let's talk.")
}

const IDLE: SubmissionStatus = SubmissionStatus {
    submitting: false,
    submit_success: false,
    submit_error: false,
};
const SUBMITTING: SubmissionStatus = SubmissionStatus {
    submitting: true,
    submit_success: false,
    submit_error: false,
};
const SUCCESS: SubmissionStatus = SubmissionStatus {
    submitting: false,
    submit_success: true,
    submit_error: false,
};
const ERROR: SubmissionStatus = SubmissionStatus {
    submitting: false,
    submit_success: false,
    submit_error: true,
};

#[test]
fn successful_submission_reverts_after_three_seconds() {
    let rig = rig();
    assert_eq!(rig.machine.submit(form()), SubmitOutcome::Sent);
    assert_eq!(rig.machine.state(), SubmissionState::Submitting);
    assert!(rig.lock.is_locked());

    rig.scheduler.advance(Millis(1000));
    assert_eq!(rig.machine.state(), SubmissionState::Success);
    assert!(rig.lock.is_locked());

    rig.scheduler.advance(Millis(2999));
    assert_eq!(rig.machine.state(), SubmissionState::Success);
    rig.scheduler.advance(Millis(1));
    assert_eq!(rig.machine.state(), SubmissionState::Idle);
    assert!(!rig.lock.is_locked());

    assert_eq!(*rig.log.borrow(), vec![IDLE, SUBMITTING, SUCCESS, IDLE]);
    assert_eq!(rig.transport.sent().len(), 1);
}

#[test]
fn failure_shows_error_then_reverts_after_five_seconds() {
    let rig = rig();
    rig.transport.set_failing(true);
    rig.machine.submit(form());
    rig.scheduler.advance(Millis(1000));
    assert_eq!(rig.machine.state(), SubmissionState::Error);
    rig.scheduler.advance(Millis(4999));
    assert_eq!(rig.machine.state(), SubmissionState::Error);
    rig.scheduler.advance(Millis(1));
    assert_eq!(rig.machine.state(), SubmissionState::Idle);
    assert_eq!(*rig.log.borrow(), vec![IDLE, SUBMITTING, ERROR, IDLE]);
    assert!(!rig.lock.is_locked());
}

#[test]
fn spam_fakes_success_without_sending() {
    let rig = rig();
    let outcome = rig.machine.submit(form().with_honeypot("http://bot.example"));
    assert_eq!(outcome, SubmitOutcome::Spam);
    assert_eq!(rig.machine.state(), SubmissionState::Submitting);
    rig.scheduler.run_until_idle();
    assert!(rig.transport.sent().is_empty());
    assert_eq!(*rig.log.borrow(), vec![IDLE, SUBMITTING, SUCCESS, IDLE]);
}

#[test]
fn submit_while_submitting_is_ignored() {
    let rig = rig();
    assert_eq!(rig.machine.submit(form()), SubmitOutcome::Sent);
    assert_eq!(rig.machine.submit(form()), SubmitOutcome::Ignored);
    rig.scheduler.run_until_idle();
    assert_eq!(rig.transport.sent().len(), 1);
}

#[test]
fn invalid_form_marks_fields_touched_and_keeps_state() {
    let rig = rig();
    let outcome = rig.machine.submit(ContactForm::default());
    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 4);
    assert!(rig.machine.all_fields_touched());
    assert_eq!(rig.machine.state(), SubmissionState::Idle);
    assert_eq!(*rig.log.borrow(), vec![IDLE]);
    assert!(!rig.lock.is_locked());
}

#[test]
fn new_submission_clears_a_pending_error() {
    let rig = rig();
    rig.transport.set_failing(true);
    rig.machine.submit(form());
    rig.scheduler.advance(Millis(1000));
    assert_eq!(rig.machine.state(), SubmissionState::Error);

    rig.transport.set_failing(false);
    assert_eq!(rig.machine.retry(), SubmitOutcome::Sent);
    assert_eq!(rig.machine.state(), SubmissionState::Submitting);

    // The old error revert must not fire into the new cycle.
    rig.scheduler.advance(Millis(999));
    assert_eq!(rig.machine.state(), SubmissionState::Submitting);
    rig.scheduler.advance(Millis(1));
    assert_eq!(rig.machine.state(), SubmissionState::Success);
    rig.scheduler.run_until_idle();
    assert_eq!(
        *rig.log.borrow(),
        vec![IDLE, SUBMITTING, ERROR, SUBMITTING, SUCCESS, IDLE]
    );
    assert_eq!(rig.transport.sent().len(), 2);
}

#[test]
fn retry_without_history_is_ignored() {
    let rig = rig();
    assert_eq!(rig.machine.retry(), SubmitOutcome::Ignored);
}

#[test]
fn teardown_cancels_timers_and_releases_lock() {
    let rig = rig();
    rig.events.scroll_to(480.0);
    rig.machine.submit(form());
    assert_eq!(rig.lock.body().top_px, -480.0);

    rig.machine.teardown();
    assert!(!rig.lock.is_locked());
    assert_eq!(rig.events.viewport().scroll_y, 480.0);
    assert_eq!(rig.machine.state(), SubmissionState::Idle);

    // The transport answer arrives after teardown and is dropped.
    rig.scheduler.run_until_idle();
    assert_eq!(rig.machine.state(), SubmissionState::Idle);
    assert_eq!(*rig.log.borrow(), vec![IDLE, SUBMITTING, IDLE]);
    assert_eq!(rig.machine.submit(form()), SubmitOutcome::Ignored);
}

#[test]
fn dropping_the_machine_releases_the_lock() {
    let rig = rig();
    rig.machine.submit(form());
    assert!(rig.lock.is_locked());
    let Rig {
        machine,
        lock,
        scheduler,
        ..
    } = rig;
    drop(machine);
    assert!(!lock.is_locked());
    scheduler.run_until_idle();
    assert!(!lock.is_locked());
}

struct ImmediateTransport {
    fail: bool,
    calls: Cell<usize>,
}

impl ContactTransport for ImmediateTransport {
    fn send(&self, _request: ContactRequest, done: SendCallback) {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            done(Err(FolioError::transport("connection refused")));
        } else {
            done(Ok(serde_json::json!({ "success": true })));
        }
    }
}

#[test]
fn synchronous_transport_results_are_handled() {
    let scheduler = Scheduler::new();
    let lock = ScrollLock::new(HostEvents::default());
    let transport = Rc::new(ImmediateTransport {
        fail: true,
        calls: Cell::new(0),
    });
    let machine = ContactSubmission::new(scheduler.clone(), transport.clone(), lock.clone(), SubmissionTiming::default());
    assert_eq!(machine.submit(form()), SubmitOutcome::Sent);
    assert_eq!(machine.state(), SubmissionState::Error);
    assert!(lock.is_locked());
    scheduler.run_until_idle();
    assert_eq!(machine.state(), SubmissionState::Idle);
    assert!(!lock.is_locked());
    assert_eq!(transport.calls.get(), 1);
}

#[test]
fn status_snapshots_never_set_two_flags() {
    for state in [
        SubmissionState::Idle,
        SubmissionState::Submitting,
        SubmissionState::Success,
        SubmissionState::Error,
    ] {
        let s = SubmissionStatus::from(state);
        let set = [s.submitting, s.submit_success, s.submit_error]
            .iter()
            .filter(|b| **b)
            .count();
        assert!(set <= 1);
        assert_eq!(s.is_idle(), state == SubmissionState::Idle);
    }
}
