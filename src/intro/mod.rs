//! Intro hero text: a typed sequence that restarts whenever the language changes.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::animation::orchestrator::TypedAnimator;
use crate::animation::typed::{AnimationTarget, TypedOptions};
use crate::foundation::core::Millis;
use crate::foundation::signal::SubscriptionId;
use crate::host::element::ElementRef;
use crate::i18n::{Language, LanguageState, Translations};
use crate::runtime::completion::Completion;
use crate::runtime::scheduler::TimerId;

/// One typed line of the intro.
#[derive(Clone)]
pub struct IntroSlot {
    pub target_id: String,
    pub translation_key: String,
    pub element: ElementRef,
    pub options: TypedOptions,
}

impl std::fmt::Debug for IntroSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntroSlot")
            .field("target_id", &self.target_id)
            .field("translation_key", &self.translation_key)
            .field("element", &self.element.id())
            .finish()
    }
}

impl IntroSlot {
    pub fn new(target_id: impl Into<String>, translation_key: impl Into<String>, element: ElementRef) -> Self {
        Self {
            target_id: target_id.into(),
            translation_key: translation_key.into(),
            element,
            options: TypedOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TypedOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Default)]
struct IntroState {
    pending: Option<TimerId>,
    subscription: Option<SubscriptionId>,
    current: Option<Completion>,
    restarts: u64,
    torn_down: bool,
}

struct IntroShared {
    animator: TypedAnimator,
    language: LanguageState,
    translations: Translations,
    slots: Vec<IntroSlot>,
    restart_delay: Millis,
    state: RefCell<IntroState>,
}

/// Mounted intro sequence.
pub struct IntroSequence {
    shared: Rc<IntroShared>,
}

impl std::fmt::Debug for IntroSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("IntroSequence")
            .field("slots", &self.shared.slots)
            .field("restarts", &state.restarts)
            .field("restart_pending", &state.pending.is_some())
            .finish()
    }
}

impl IntroSequence {
    /// Subscribe to `language`. Each emission, the current one included, schedules a restart
    /// after `restart_delay`, replacing a restart that is still pending.
    pub fn mount(
        animator: TypedAnimator,
        language: LanguageState,
        translations: Translations,
        slots: Vec<IntroSlot>,
        restart_delay: Millis,
    ) -> Self {
        let shared = Rc::new(IntroShared {
            animator,
            language: language.clone(),
            translations,
            slots,
            restart_delay,
            state: RefCell::new(IntroState::default()),
        });
        let weak = Rc::downgrade(&shared);
        let subscription = language.subscribe(move |lang| {
            if let Some(shared) = weak.upgrade() {
                IntroShared::schedule_restart(&shared, *lang);
            }
        });
        shared.state.borrow_mut().subscription = Some(subscription);
        Self { shared }
    }

    /// Completion of the sequence started by the latest restart, if any.
    pub fn current_sequence(&self) -> Option<Completion> {
        self.shared.state.borrow().current.clone()
    }

    pub fn restarts(&self) -> u64 {
        self.shared.state.borrow().restarts
    }

    pub fn is_restart_pending(&self) -> bool {
        self.shared.state.borrow().pending.is_some()
    }

    /// Restart right away with the current language.
    pub fn restart_now(&self) {
        let lang = self.shared.language.current();
        self.shared.restart(lang);
    }

    /// Unsubscribe from the language, cancel a pending restart and stop all animations.
    pub fn teardown(&self) {
        self.shared.teardown();
    }
}

impl Drop for IntroSequence {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl IntroShared {
    fn schedule_restart(this: &Rc<Self>, lang: Language) {
        let previous = {
            let mut state = this.state.borrow_mut();
            if state.torn_down {
                return;
            }
            state.pending.take()
        };
        let scheduler = this.animator.scheduler();
        if let Some(id) = previous {
            scheduler.clear_timeout(id);
        }
        let weak: Weak<Self> = Rc::downgrade(this);
        let id = scheduler.set_timeout(this.restart_delay, move || {
            if let Some(shared) = weak.upgrade() {
                shared.state.borrow_mut().pending = None;
                shared.restart(lang);
            }
        });
        this.state.borrow_mut().pending = Some(id);
        tracing::debug!(%lang, delay = %this.restart_delay, "intro restart scheduled");
    }

    fn restart(&self, lang: Language) {
        if self.state.borrow().torn_down {
            return;
        }
        self.animator.destroy_all();
        let targets = self
            .slots
            .iter()
            .map(|slot| {
                AnimationTarget::new(
                    slot.target_id.clone(),
                    Rc::clone(&slot.element),
                    self.translations.instant(lang, &slot.translation_key),
                )
                .with_options(slot.options.clone())
            })
            .collect();
        let completion = self.animator.animate_sequence(targets);
        let mut state = self.state.borrow_mut();
        state.current = Some(completion);
        state.restarts += 1;
        tracing::info!(%lang, restarts = state.restarts, "intro sequence started");
    }

    fn teardown(&self) {
        let (pending, subscription) = {
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            (state.pending.take(), state.subscription.take())
        };
        if let Some(id) = subscription {
            self.language.unsubscribe(id);
        }
        if let Some(id) = pending {
            self.animator.scheduler().clear_timeout(id);
        }
        self.animator.destroy_all();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/intro/sequence.rs"]
mod tests;
