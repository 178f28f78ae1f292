//! JSON configuration for every component, with the application's defaults.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context as _;

use crate::animation::orchestrator::AnimatorTiming;
use crate::animation::typed::TypedOptions;
use crate::contact::form::is_valid_email;
use crate::contact::relay::RelaySettings;
use crate::contact::submission::SubmissionTiming;
use crate::contact::transport::DEFAULT_ENDPOINT;
use crate::foundation::core::Millis;
use crate::foundation::error::{FolioError, FolioResult};
use crate::i18n::{Language, Translations};
use crate::pointer::follower::FollowerSettings;
use crate::scroll::header::HeaderSettings;
use crate::scroll::progress::ScrollSettings;
use crate::watch::overlap_watcher::WatchOptions;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub timing: AnimatorTiming,
    /// Options applied to targets that do not bring their own.
    pub options: TypedOptions,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// The overlay can only be open at or below this viewport width.
    pub mobile_max_width_px: f64,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            mobile_max_width_px: 1024.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub endpoint: String,
    pub timing: SubmissionTiming,
    /// Answer delay of the simulated and in-process transports.
    pub simulated_latency: Millis,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timing: SubmissionTiming::default(),
            simulated_latency: Millis(1000),
        }
    }
}

/// One typed intro line: the element id and the translation key of its text.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntroSlotConfig {
    pub target_id: String,
    pub key: String,
}

impl IntroSlotConfig {
    fn new(target_id: &str, key: &str) -> Self {
        Self {
            target_id: target_id.to_owned(),
            key: key.to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub restart_delay: Millis,
    pub slots: Vec<IntroSlotConfig>,
    pub translations: Translations,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            restart_delay: Millis(100),
            slots: vec![
                IntroSlotConfig::new("intro-subtitle", "intro.subtitle"),
                IntroSlotConfig::new("intro-title1", "intro.title1"),
                IntroSlotConfig::new("intro-title2", "intro.title2"),
            ],
            translations: Translations::new()
                .with(Language::De, "intro.subtitle", "Hallo, ich bin")
                .with(Language::De, "intro.title1", "Frontend")
                .with(Language::De, "intro.title2", "Entwickler")
                .with(Language::En, "intro.subtitle", "Hi, I am")
                .with(Language::En, "intro.title1", "Frontend")
                .with(Language::En, "intro.title2", "Developer"),
        }
    }
}

/// Top-level configuration document. Every section and field may be omitted.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub typing: TypingConfig,
    pub overlap: WatchOptions,
    pub scroll: ScrollSettings,
    pub header: HeaderSettings,
    pub follower: FollowerSettings,
    pub menu: MenuConfig,
    pub contact: ContactConfig,
    pub relay: RelaySettings,
    pub intro: IntroConfig,
}

impl FolioConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> FolioResult<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> FolioResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!("config loaded");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> FolioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> FolioResult<()> {
        if self.typing.options.type_speed_ms == 0 {
            return Err(FolioError::validation("typing.options.type_speed_ms must be > 0"));
        }
        if self.typing.timing.retry_delay == Millis::ZERO {
            return Err(FolioError::validation("typing.timing.retry_delay must be > 0"));
        }

        if self.overlap.primary_color.trim().is_empty() || self.overlap.overlap_color.trim().is_empty() {
            return Err(FolioError::validation("overlap colors must be non-empty"));
        }
        positive("overlap.narrow_breakpoint_px", self.overlap.narrow_breakpoint_px)?;

        finite("scroll.start_offset_px", self.scroll.start_offset_px)?;
        positive("scroll.duration_px", self.scroll.duration_px)?;
        finite("scroll.effects.factor", self.scroll.effects.factor)?;
        positive("scroll.effects.fade_threshold", self.scroll.effects.fade_threshold)?;
        non_negative("scroll.effects.base_height", self.scroll.effects.base_height)?;

        non_negative("header.hide_after_px", self.header.hide_after_px)?;
        non_negative("header.pointer_reveal_px", self.header.pointer_reveal_px)?;

        let f = &self.follower;
        if !(f.smoothing > 0.0 && f.smoothing <= 1.0) {
            return Err(FolioError::validation("follower.smoothing must be in (0, 1]"));
        }
        non_negative("follower.base_size_px", f.base_size_px)?;
        non_negative("follower.expanded_size_px", f.expanded_size_px)?;
        positive("follower.reference_width_px", f.reference_width_px)?;
        non_negative("follower.mobile_max_width_px", f.mobile_max_width_px)?;
        if f.frame_interval == Millis::ZERO {
            return Err(FolioError::validation("follower.frame_interval must be > 0"));
        }

        positive("menu.mobile_max_width_px", self.menu.mobile_max_width_px)?;

        if self.contact.endpoint.trim().is_empty() {
            return Err(FolioError::validation("contact.endpoint must be non-empty"));
        }
        for (name, address) in [
            ("relay.recipient", &self.relay.recipient),
            ("relay.sender", &self.relay.sender),
        ] {
            if !is_valid_email(address) {
                return Err(FolioError::validation(format!(
                    "{name} is not a valid address: '{address}'"
                )));
            }
        }

        let mut ids = BTreeSet::new();
        for slot in &self.intro.slots {
            if slot.target_id.trim().is_empty() || slot.key.trim().is_empty() {
                return Err(FolioError::validation("intro slots need a target_id and a key"));
            }
            if !ids.insert(slot.target_id.as_str()) {
                return Err(FolioError::validation(format!(
                    "duplicate intro target_id '{}'",
                    slot.target_id
                )));
            }
        }
        Ok(())
    }
}

fn finite(name: &str, v: f64) -> FolioResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(FolioError::validation(format!("{name} must be finite")))
    }
}

fn positive(name: &str, v: f64) -> FolioResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(FolioError::validation(format!("{name} must be finite and > 0")))
    }
}

fn non_negative(name: &str, v: f64) -> FolioResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(FolioError::validation(format!("{name} must be finite and >= 0")))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
