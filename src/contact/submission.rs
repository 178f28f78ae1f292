//! Submission lifecycle of the contact form and the overlay it drives.
//!
//! `Idle -> Submitting -> Success | Error -> Idle`. Success and Error revert on their own after a
//! fixed delay. Every transition publishes a [`SubmissionStatus`] snapshot, and a body scroll
//! lock is held for exactly as long as the state is not `Idle`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::contact::form::{ContactForm, FormErrors};
use crate::contact::transport::{ContactRequest, ContactTransport, DEFAULT_ENDPOINT};
use crate::foundation::core::Millis;
use crate::foundation::error::FolioResult;
use crate::foundation::signal::{Signal, SubscriptionId};
use crate::host::scroll_lock::{ScrollLock, ScrollLockGuard};
use crate::runtime::scheduler::{Scheduler, TimerId};

const LOCK_OWNER: &str = "contact-overlay";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

/// Overlay flags. At most one is set; all clear means idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatus {
    pub submitting: bool,
    pub submit_success: bool,
    pub submit_error: bool,
}

impl From<SubmissionState> for SubmissionStatus {
    fn from(state: SubmissionState) -> Self {
        Self {
            submitting: state == SubmissionState::Submitting,
            submit_success: state == SubmissionState::Success,
            submit_error: state == SubmissionState::Error,
        }
    }
}

impl SubmissionStatus {
    pub fn is_idle(&self) -> bool {
        !(self.submitting || self.submit_success || self.submit_error)
    }
}

/// What [`ContactSubmission::submit`] did with a form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight, or the machine is torn down.
    Ignored,
    /// Validation failed; every field is now marked touched.
    Invalid(FormErrors),
    /// Honeypot filled: fake success without sending anything.
    Spam,
    /// Handed to the transport.
    Sent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SubmissionTiming {
    /// Fake send time on the spam branch.
    pub spam_latency: Millis,
    pub success_revert: Millis,
    pub error_revert: Millis,
}

impl Default for SubmissionTiming {
    fn default() -> Self {
        Self {
            spam_latency: Millis(1000),
            success_revert: Millis(3000),
            error_revert: Millis(5000),
        }
    }
}

struct Inner {
    state: SubmissionState,
    /// Bumped on every new submission and on teardown; late callbacks from an older cycle are
    /// dropped.
    cycle: u64,
    timer: Option<TimerId>,
    guard: Option<ScrollLockGuard>,
    last_form: Option<ContactForm>,
    touched: bool,
    torn_down: bool,
}

struct Shared {
    scheduler: Scheduler,
    transport: Rc<dyn ContactTransport>,
    lock: ScrollLock,
    endpoint: String,
    timing: SubmissionTiming,
    status: Signal<SubmissionStatus>,
    inner: RefCell<Inner>,
}

/// Contact submission state machine.
pub struct ContactSubmission {
    shared: Rc<Shared>,
}

impl std::fmt::Debug for ContactSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.borrow();
        f.debug_struct("ContactSubmission")
            .field("state", &inner.state)
            .field("cycle", &inner.cycle)
            .field("endpoint", &self.shared.endpoint)
            .finish()
    }
}

impl ContactSubmission {
    pub fn new(
        scheduler: Scheduler,
        transport: Rc<dyn ContactTransport>,
        lock: ScrollLock,
        timing: SubmissionTiming,
    ) -> Self {
        Self::with_endpoint(scheduler, transport, lock, timing, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(
        scheduler: Scheduler,
        transport: Rc<dyn ContactTransport>,
        lock: ScrollLock,
        timing: SubmissionTiming,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                scheduler,
                transport,
                lock,
                endpoint: endpoint.into(),
                timing,
                status: Signal::new(SubmissionStatus::default()),
                inner: RefCell::new(Inner {
                    state: SubmissionState::Idle,
                    cycle: 0,
                    timer: None,
                    guard: None,
                    last_form: None,
                    touched: false,
                    torn_down: false,
                }),
            }),
        }
    }

    /// Submit `form`.
    ///
    /// Never fails: validation problems come back as [`SubmitOutcome::Invalid`], transport
    /// problems end in the `Error` state.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn submit(&self, form: ContactForm) -> SubmitOutcome {
        Shared::submit(&self.shared, form)
    }

    /// Submit the last form again (the overlay's retry button).
    pub fn retry(&self) -> SubmitOutcome {
        let last = self.shared.inner.borrow().last_form.clone();
        match last {
            Some(form) => self.submit(form),
            None => SubmitOutcome::Ignored,
        }
    }

    /// Cancel pending timers, drop late transport results, return to `Idle` and release the
    /// scroll lock. Further submissions are ignored.
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    pub fn state(&self) -> SubmissionState {
        self.shared.inner.borrow().state
    }

    pub fn status(&self) -> Signal<SubmissionStatus> {
        self.shared.status.clone()
    }

    /// Subscribe to status snapshots; the current one is delivered immediately.
    pub fn subscribe(&self, f: impl Fn(&SubmissionStatus) + 'static) -> SubscriptionId {
        self.shared.status.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.status.unsubscribe(id)
    }

    /// Set once a submission failed validation.
    pub fn all_fields_touched(&self) -> bool {
        self.shared.inner.borrow().touched
    }
}

impl Drop for ContactSubmission {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl Shared {
    fn submit(this: &Rc<Self>, form: ContactForm) -> SubmitOutcome {
        {
            let inner = this.inner.borrow();
            if inner.torn_down {
                return SubmitOutcome::Ignored;
            }
            if inner.state == SubmissionState::Submitting {
                tracing::debug!("submission already in flight; ignoring");
                return SubmitOutcome::Ignored;
            }
        }

        if let Err(errors) = form.validate() {
            tracing::debug!(%errors, "contact form invalid");
            this.inner.borrow_mut().touched = true;
            return SubmitOutcome::Invalid(errors);
        }

        let spam = form.is_spam();
        let request = if spam {
            None
        } else {
            Some(ContactRequest::post_json(&this.endpoint, &form))
        };

        let cycle = {
            let mut inner = this.inner.borrow_mut();
            inner.cycle += 1;
            inner.last_form = Some(form);
            inner.cycle
        };
        this.transition(SubmissionState::Submitting);

        match request {
            None => {
                tracing::info!("honeypot filled; faking success");
                let weak = Rc::downgrade(this);
                let timer = this.scheduler.set_timeout(this.timing.spam_latency, move || {
                    Self::with_live(&weak, cycle, |shared| {
                        shared.finish(cycle, SubmissionState::Success);
                    });
                });
                this.set_timer(cycle, timer);
                SubmitOutcome::Spam
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "could not encode contact request");
                this.finish(cycle, SubmissionState::Error);
                SubmitOutcome::Sent
            }
            Some(Ok(request)) => {
                let weak = Rc::downgrade(this);
                this.transport.send(
                    request,
                    Box::new(move |result: FolioResult<serde_json::Value>| {
                        Self::with_live(&weak, cycle, |shared| match result {
                            Ok(_) => shared.finish(cycle, SubmissionState::Success),
                            Err(err) => {
                                tracing::warn!(error = %err, "contact submission failed");
                                shared.finish(cycle, SubmissionState::Error);
                            }
                        });
                    }),
                );
                SubmitOutcome::Sent
            }
        }
    }

    /// Run `f` if the machine still exists and `cycle` is current.
    fn with_live(weak: &Weak<Self>, cycle: u64, f: impl FnOnce(&Rc<Self>)) {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let live = {
            let inner = shared.inner.borrow();
            !inner.torn_down && inner.cycle == cycle
        };
        if live {
            f(&shared);
        } else {
            tracing::debug!(cycle, "dropping stale submission callback");
        }
    }

    fn set_timer(&self, cycle: u64, timer: TimerId) {
        let stale = {
            let mut inner = self.inner.borrow_mut();
            if inner.cycle == cycle && !inner.torn_down {
                inner.timer = Some(timer);
                false
            } else {
                true
            }
        };
        if stale {
            self.scheduler.clear_timeout(timer);
        }
    }

    /// Leave `Submitting` for `outcome` and schedule the revert to `Idle`.
    fn finish(self: &Rc<Self>, cycle: u64, outcome: SubmissionState) {
        if self.inner.borrow().state != SubmissionState::Submitting {
            return;
        }
        self.transition(outcome);
        let delay = match outcome {
            SubmissionState::Error => self.timing.error_revert,
            _ => self.timing.success_revert,
        };
        let weak = Rc::downgrade(self);
        let timer = self.scheduler.set_timeout(delay, move || {
            Self::with_live(&weak, cycle, |shared| {
                shared.inner.borrow_mut().timer = None;
                shared.transition(SubmissionState::Idle);
            });
        });
        self.set_timer(cycle, timer);
    }

    /// Move to `next`, adjust the scroll lock and publish the snapshot. No borrow is held while
    /// the lock is released or subscribers run.
    fn transition(&self, next: SubmissionState) {
        let (released, prev_timer) = {
            let mut inner = self.inner.borrow_mut();
            let prev = inner.state;
            inner.state = next;
            let prev_timer = inner.timer.take();
            let released = if next == SubmissionState::Idle {
                inner.guard.take()
            } else {
                if inner.guard.is_none() {
                    inner.guard = Some(self.lock.acquire(LOCK_OWNER));
                }
                None
            };
            tracing::debug!(?prev, ?next, "submission state");
            (released, prev_timer)
        };
        if let Some(timer) = prev_timer {
            self.scheduler.clear_timeout(timer);
        }
        drop(released);
        self.status.set_if_changed(next.into());
    }

    fn teardown(&self) {
        let (timer, guard) = {
            let mut inner = self.inner.borrow_mut();
            if inner.torn_down {
                return;
            }
            inner.torn_down = true;
            inner.cycle += 1;
            inner.state = SubmissionState::Idle;
            (inner.timer.take(), inner.guard.take())
        };
        if let Some(timer) = timer {
            self.scheduler.clear_timeout(timer);
        }
        drop(guard);
        self.status.set_if_changed(SubmissionStatus::default());
        tracing::debug!("contact submission torn down");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/contact/submission.rs"]
mod tests;
