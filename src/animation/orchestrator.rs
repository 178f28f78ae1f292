//! Sequential typed-text animation.
//!
//! Every live instance is keyed by its target id and carries a generation number. Timer
//! callbacks hold the generation they were scheduled for and do nothing once the instance has
//! been destroyed or replaced. Sequences carry an epoch in the same way, so `destroy_all` or a
//! newer sequence stops an in-flight chain between two items.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::animation::typed::{AnimationEvent, AnimationTarget, CURSOR_STYLE, typed_prefix};
use crate::foundation::core::Millis;
use crate::foundation::error::{FolioError, FolioResult};
use crate::foundation::signal::{Emitter, SubscriptionId};
use crate::host::element::ElementRef;
use crate::runtime::completion::Completion;
use crate::runtime::scheduler::{Scheduler, TimerId};

/// Fixed delays around each typed reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimatorTiming {
    /// Wait between preparing an element and typing into it.
    pub prepare_delay: Millis,
    /// Wait after the last character before the instance completes, so the final glyph is
    /// painted before anything else starts.
    pub settle_delay: Millis,
    /// Pause between two items of a sequence.
    pub sequence_gap: Millis,
    /// Poll interval while a target element is not attached yet.
    pub retry_delay: Millis,
}

impl Default for AnimatorTiming {
    fn default() -> Self {
        Self {
            prepare_delay: Millis(50),
            settle_delay: Millis(50),
            sequence_gap: Millis(100),
            retry_delay: Millis(50),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Begin { prepared: bool },
    Type(usize),
    Settle,
}

struct Instance {
    generation: u64,
    element: ElementRef,
    completion: Completion,
    timer: Option<TimerId>,
    cursor: bool,
    finished: bool,
}

struct SequenceRun {
    epoch: u64,
    current: Option<String>,
    gap_timer: Option<TimerId>,
    completion: Completion,
}

#[derive(Default)]
struct AnimatorState {
    instances: HashMap<String, Instance>,
    next_generation: u64,
    epoch: u64,
    sequence: Option<SequenceRun>,
}

struct AnimatorShared {
    scheduler: Scheduler,
    timing: AnimatorTiming,
    events: Emitter<AnimationEvent>,
    state: RefCell<AnimatorState>,
}

/// Runs typed reveals on host elements, one instance per target id.
#[derive(Clone)]
pub struct TypedAnimator {
    shared: Rc<AnimatorShared>,
}

impl std::fmt::Debug for TypedAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("TypedAnimator")
            .field("instances", &state.instances.len())
            .field("sequence_active", &state.sequence.is_some())
            .field("timing", &self.shared.timing)
            .finish()
    }
}

impl TypedAnimator {
    pub fn new(scheduler: Scheduler, timing: AnimatorTiming) -> Self {
        Self {
            shared: Rc::new(AnimatorShared {
                scheduler,
                timing,
                events: Emitter::new(),
                state: RefCell::new(AnimatorState::default()),
            }),
        }
    }

    /// Type `target.text` into `target.element`.
    ///
    /// Any live instance with the same id is destroyed first. The returned completion resolves
    /// once: after the full text plus the settle delay, when the instance is destroyed, or right
    /// away if the element rejects a write. It never fails.
    pub fn animate(&self, target: AnimationTarget) -> Completion {
        AnimatorShared::animate(&self.shared, target)
    }

    /// Animate `targets` strictly one after another.
    ///
    /// Supersedes any sequence still running. The returned completion resolves after the last
    /// item (and the trailing gap), or as a no-op when this sequence is superseded.
    pub fn animate_sequence(&self, targets: Vec<AnimationTarget>) -> Completion {
        AnimatorShared::animate_sequence(&self.shared, targets)
    }

    /// Stop and forget the instance for `target_id`. Unknown ids are ignored.
    pub fn destroy(&self, target_id: &str) {
        self.shared.destroy(target_id);
    }

    /// Stop every instance and the running sequence.
    pub fn destroy_all(&self) {
        self.shared.destroy_all();
    }

    /// Whether `target_id` has an instance that has not completed yet.
    pub fn is_animating(&self, target_id: &str) -> bool {
        self.shared
            .state
            .borrow()
            .instances
            .get(target_id)
            .is_some_and(|i| !i.finished)
    }

    /// Tracked instances, finished ones included until destroyed.
    pub fn instance_count(&self) -> usize {
        self.shared.state.borrow().instances.len()
    }

    pub fn subscribe(&self, f: impl Fn(&AnimationEvent) + 'static) -> SubscriptionId {
        self.shared.events.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.shared.scheduler
    }

    pub fn timing(&self) -> AnimatorTiming {
        self.shared.timing
    }
}

fn prepare_element(element: &ElementRef) -> FolioResult<()> {
    element.set_text("")?;
    element.set_style("opacity", "1")?;
    element.set_style("visibility", "visible")
}

impl AnimatorShared {
    #[tracing::instrument(level = "debug", skip(this, target), fields(target_id = %target.target_id))]
    fn animate(this: &Rc<Self>, target: AnimationTarget) -> Completion {
        this.destroy(&target.target_id);

        let prepared = target.element.is_attached();
        if prepared {
            if let Err(err) = prepare_element(&target.element) {
                this.report_failure(&target.target_id, &err);
                this.emit(AnimationEvent::Completed {
                    target_id: target.target_id.clone(),
                    at: this.scheduler.now(),
                });
                return Completion::resolved();
            }
        }

        let completion = Completion::new();
        let generation = {
            let mut state = this.state.borrow_mut();
            state.next_generation += 1;
            let generation = state.next_generation;
            state.instances.insert(
                target.target_id.clone(),
                Instance {
                    generation,
                    element: Rc::clone(&target.element),
                    completion: completion.clone(),
                    timer: None,
                    cursor: false,
                    finished: false,
                },
            );
            generation
        };

        let delay = this
            .timing
            .prepare_delay
            .saturating_add(Millis(target.options.start_delay_ms));
        Self::schedule(this, Rc::new(target), generation, delay, Step::Begin { prepared });
        completion
    }

    fn schedule(
        this: &Rc<Self>,
        target: Rc<AnimationTarget>,
        generation: u64,
        delay: Millis,
        step: Step,
    ) {
        let weak = Rc::downgrade(this);
        let t = Rc::clone(&target);
        let timer = this.scheduler.set_timeout(delay, move || {
            if let Some(shared) = weak.upgrade() {
                Self::run_step(&shared, t, generation, step);
            }
        });

        let stale = {
            let mut state = this.state.borrow_mut();
            match state.instances.get_mut(&target.target_id) {
                Some(inst) if inst.generation == generation => {
                    inst.timer = Some(timer);
                    false
                }
                _ => true,
            }
        };
        if stale {
            this.scheduler.clear_timeout(timer);
        }
    }

    fn is_live(&self, target_id: &str, generation: u64) -> bool {
        self.state
            .borrow()
            .instances
            .get(target_id)
            .is_some_and(|i| i.generation == generation && !i.finished)
    }

    /// Forget the fired timer and report whether the instance is still the live one.
    fn claim_step(&self, target_id: &str, generation: u64) -> bool {
        let mut state = self.state.borrow_mut();
        match state.instances.get_mut(target_id) {
            Some(inst) if inst.generation == generation && !inst.finished => {
                inst.timer = None;
                true
            }
            _ => false,
        }
    }

    fn run_step(this: &Rc<Self>, target: Rc<AnimationTarget>, generation: u64, step: Step) {
        if !this.claim_step(&target.target_id, generation) {
            tracing::trace!(target_id = %target.target_id, "dropping step of superseded instance");
            return;
        }

        match step {
            Step::Begin { prepared } => {
                if !target.element.is_attached() {
                    tracing::debug!(target_id = %target.target_id, "element not attached yet; retrying");
                    let retry = this.timing.retry_delay;
                    Self::schedule(this, target, generation, retry, Step::Begin { prepared });
                    return;
                }
                if !prepared {
                    if let Err(err) = prepare_element(&target.element) {
                        this.fail(&target.target_id, generation, &err);
                        return;
                    }
                }
                if target.options.show_cursor {
                    if let Err(err) = target
                        .element
                        .set_style(CURSOR_STYLE, &target.options.cursor_char)
                    {
                        this.fail(&target.target_id, generation, &err);
                        return;
                    }
                    if let Some(inst) = this.state.borrow_mut().instances.get_mut(&target.target_id) {
                        inst.cursor = true;
                    }
                }

                this.emit(AnimationEvent::Started {
                    target_id: target.target_id.clone(),
                    at: this.scheduler.now(),
                });
                // A listener may have destroyed the instance.
                if !this.is_live(&target.target_id, generation) {
                    return;
                }
                if target.text.is_empty() {
                    Self::revealed(this, target, generation);
                } else {
                    let speed = Millis(target.options.type_speed_ms);
                    Self::schedule(this, target, generation, speed, Step::Type(1));
                }
            }
            Step::Type(n) => {
                let visible = typed_prefix(&target.text, n);
                if let Err(err) = target.element.set_text(visible) {
                    this.fail(&target.target_id, generation, &err);
                    return;
                }
                if n >= target.text.chars().count() {
                    Self::revealed(this, target, generation);
                } else {
                    let speed = Millis(target.options.type_speed_ms);
                    Self::schedule(this, target, generation, speed, Step::Type(n + 1));
                }
            }
            Step::Settle => this.finish(&target.target_id, generation),
        }
    }

    fn revealed(this: &Rc<Self>, target: Rc<AnimationTarget>, generation: u64) {
        this.emit(AnimationEvent::Revealed {
            target_id: target.target_id.clone(),
            at: this.scheduler.now(),
        });
        if this.is_live(&target.target_id, generation) {
            let settle = this.timing.settle_delay;
            Self::schedule(this, target, generation, settle, Step::Settle);
        }
    }

    fn finish(&self, target_id: &str, generation: u64) {
        let completion = {
            let mut state = self.state.borrow_mut();
            match state.instances.get_mut(target_id) {
                Some(inst) if inst.generation == generation && !inst.finished => {
                    inst.finished = true;
                    inst.timer = None;
                    Some(inst.completion.clone())
                }
                _ => None,
            }
        };
        let Some(completion) = completion else {
            return;
        };
        self.emit(AnimationEvent::Completed {
            target_id: target_id.to_owned(),
            at: self.scheduler.now(),
        });
        completion.resolve();
    }

    fn report_failure(&self, target_id: &str, err: &FolioError) {
        tracing::warn!(target_id, error = %err, "typed animation failed; treating as complete");
        self.emit(AnimationEvent::Failed {
            target_id: target_id.to_owned(),
            at: self.scheduler.now(),
            message: err.to_string(),
        });
    }

    fn fail(&self, target_id: &str, generation: u64, err: &FolioError) {
        self.report_failure(target_id, err);
        self.finish(target_id, generation);
    }

    fn emit(&self, event: AnimationEvent) {
        self.events.emit(&event);
    }

    fn destroy(&self, target_id: &str) {
        let Some(inst) = self.state.borrow_mut().instances.remove(target_id) else {
            return;
        };
        if let Some(timer) = inst.timer {
            self.scheduler.clear_timeout(timer);
        }
        if inst.cursor {
            if let Err(err) = inst.element.remove_style(CURSOR_STYLE) {
                tracing::warn!(target_id, error = %err, "could not remove typed cursor");
            }
        }
        if !inst.finished {
            tracing::debug!(target_id, "typed animation cancelled");
            self.emit(AnimationEvent::Cancelled {
                target_id: target_id.to_owned(),
                at: self.scheduler.now(),
            });
        }
        inst.completion.resolve();
    }

    fn destroy_all(&self) {
        let (ids, sequence) = {
            let mut state = self.state.borrow_mut();
            state.epoch += 1;
            let sequence = state.sequence.take();
            let mut ids: Vec<String> = state.instances.keys().cloned().collect();
            ids.sort();
            (ids, sequence)
        };
        if let Some(run) = sequence {
            if let Some(timer) = run.gap_timer {
                self.scheduler.clear_timeout(timer);
            }
            run.completion.resolve();
        }
        for id in ids {
            self.destroy(&id);
        }
    }

    #[tracing::instrument(level = "debug", skip(this, targets), fields(len = targets.len()))]
    fn animate_sequence(this: &Rc<Self>, targets: Vec<AnimationTarget>) -> Completion {
        let (epoch, previous) = {
            let mut state = this.state.borrow_mut();
            state.epoch += 1;
            (state.epoch, state.sequence.take())
        };
        if let Some(prev) = previous {
            tracing::debug!("superseding running sequence");
            if let Some(timer) = prev.gap_timer {
                this.scheduler.clear_timeout(timer);
            }
            if let Some(current) = prev.current {
                this.destroy(&current);
            }
            prev.completion.resolve();
        }

        for target in &targets {
            if !target.element.is_attached() {
                continue;
            }
            if let Err(err) = prepare_element(&target.element) {
                tracing::warn!(target_id = %target.target_id, error = %err, "could not prepare sequence element");
            }
        }

        let completion = Completion::new();
        this.state.borrow_mut().sequence = Some(SequenceRun {
            epoch,
            current: None,
            gap_timer: None,
            completion: completion.clone(),
        });
        Self::run_sequence_item(this, targets.into(), epoch, 0);
        completion
    }

    fn run_sequence_item(this: &Rc<Self>, queue: Rc<[AnimationTarget]>, epoch: u64, index: usize) {
        let Some(target) = queue.get(index).cloned() else {
            let done = {
                let mut state = this.state.borrow_mut();
                if state.sequence.as_ref().is_some_and(|s| s.epoch == epoch) {
                    state.sequence.take().map(|s| s.completion)
                } else {
                    None
                }
            };
            if let Some(completion) = done {
                tracing::debug!(items = queue.len(), "sequence finished");
                completion.resolve();
            }
            return;
        };

        {
            let mut state = this.state.borrow_mut();
            let Some(run) = state.sequence.as_mut().filter(|s| s.epoch == epoch) else {
                return;
            };
            run.current = Some(target.target_id.clone());
            run.gap_timer = None;
        }

        let item = Self::animate(this, target);
        let weak = Rc::downgrade(this);
        item.then(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let gap = shared.timing.sequence_gap;
            let next = Rc::downgrade(&shared);
            let q = Rc::clone(&queue);
            let timer = shared.scheduler.set_timeout(gap, move || {
                if let Some(shared) = next.upgrade() {
                    Self::run_sequence_item(&shared, q, epoch, index + 1);
                }
            });
            let stale = {
                let mut state = shared.state.borrow_mut();
                match state.sequence.as_mut() {
                    Some(run) if run.epoch == epoch => {
                        run.gap_timer = Some(timer);
                        false
                    }
                    _ => true,
                }
            };
            if stale {
                shared.scheduler.clear_timeout(timer);
            }
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/orchestrator.rs"]
mod tests;
