//! Headless motion and interaction core of a portfolio page.
//!
//! Everything runs on one thread against a virtual clock ([`Scheduler`]). Hosts feed
//! viewport and pointer events through [`HostEvents`] and expose elements via
//! [`Element`].

#![forbid(unsafe_code)]

pub mod animation;
pub mod config;
pub mod contact;
pub mod foundation;
pub mod geometry;
pub mod host;
pub mod i18n;
pub mod intro;
pub mod pointer;
pub mod runtime;
pub mod scroll;
pub mod watch;

pub use animation::ease::Ease;
pub use animation::orchestrator::{AnimatorTiming, TypedAnimator};
pub use animation::typed::{AnimationEvent, AnimationTarget, TypedOptions};
pub use config::FolioConfig;
pub use contact::form::{ContactForm, FieldError, FormErrors, FormField};
pub use contact::relay::{MailRelay, Mailer, MemoryMailer, OutboxMailer, RelayRequest, RelayResponse};
pub use contact::submission::{
    ContactSubmission, SubmissionState, SubmissionStatus, SubmissionTiming, SubmitOutcome,
};
pub use contact::transport::{ContactTransport, RelayTransport, SimulatedTransport};
pub use foundation::core::{Millis, Point, Rect, Size};
pub use foundation::error::{FolioError, FolioResult};
pub use foundation::signal::{Emitter, Signal, SubscriptionId};
pub use geometry::overlap::{OverlapDecision, OverlapPolicy, intersect, overlap_ratio};
pub use host::element::{Element, ElementRef, MemoryElement};
pub use host::events::{Capabilities, HostEvent, HostEvents, Viewport};
pub use host::menu_overlay::MenuOverlay;
pub use host::scroll_lock::{ScrollLock, ScrollLockGuard};
pub use i18n::{Language, LanguageState, Translations};
pub use intro::{IntroSequence, IntroSlot};
pub use pointer::follower::{FollowerDriver, MouseFollower};
pub use runtime::completion::Completion;
pub use runtime::scheduler::{Scheduler, TimerId};
pub use scroll::driver::{ScrollDriver, ScrollTargets};
pub use scroll::header::HeaderAutoHide;
pub use scroll::progress::{ScrollProgress, ScrollSettings, on_scroll};
pub use watch::overlap_watcher::{OverlapWatcher, WatchOptions, WatchToken};
