//! Active language and string lookup.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::foundation::signal::{Signal, SubscriptionId};

/// Key under which the chosen language is persisted.
pub const PREFERENCE_KEY: &str = "preferredLanguage";

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::De, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
        }
    }

    /// Parse a language tag. Only the primary subtag counts, so `en-GB` is English.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?;
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(primary))
    }

    /// Saved preference first, then the browser language if supported, then German.
    pub fn resolve_initial(saved: Option<&str>, browser: Option<&str>) -> Self {
        saved
            .and_then(Self::parse)
            .or_else(|| browser.and_then(Self::parse))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-language string tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Translations {
    tables: BTreeMap<Language, BTreeMap<String, String>>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lang: Language, key: impl Into<String>, value: impl Into<String>) {
        self.tables
            .entry(lang)
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn with(mut self, lang: Language, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(lang, key, value);
        self
    }

    /// Look `key` up in `lang`, then in German, then give the key back unchanged.
    pub fn instant(&self, lang: Language, key: &str) -> String {
        let lookup = |l: Language| self.tables.get(&l).and_then(|t| t.get(key));
        match lookup(lang).or_else(|| lookup(Language::default())) {
            Some(v) => v.clone(),
            None => {
                tracing::debug!(%lang, key, "missing translation");
                key.to_owned()
            }
        }
    }

    pub fn contains(&self, lang: Language, key: &str) -> bool {
        self.tables.get(&lang).is_some_and(|t| t.contains_key(key))
    }
}

/// Key/value persistence standing in for browser local storage.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }
}

/// The active language, observable, optionally persisted.
#[derive(Clone)]
pub struct LanguageState {
    current: Signal<Language>,
    store: Option<Rc<dyn PreferenceStore>>,
}

impl std::fmt::Debug for LanguageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageState")
            .field("current", &self.current.get())
            .field("persisted", &self.store.is_some())
            .finish()
    }
}

impl LanguageState {
    /// In-memory state without persistence.
    pub fn new(initial: Language) -> Self {
        Self {
            current: Signal::new(initial),
            store: None,
        }
    }

    /// Resolve the initial language from `store` and the browser language, and persist it.
    pub fn with_store(store: Rc<dyn PreferenceStore>, browser: Option<&str>) -> Self {
        let saved = store.get(PREFERENCE_KEY);
        let initial = Language::resolve_initial(saved.as_deref(), browser);
        store.set(PREFERENCE_KEY, initial.code());
        Self {
            current: Signal::new(initial),
            store: Some(store),
        }
    }

    pub fn current(&self) -> Language {
        self.current.get()
    }

    /// Activate `lang`. Subscribers are notified even if it was already active.
    pub fn switch(&self, lang: Language) {
        tracing::info!(%lang, "language switched");
        if let Some(store) = &self.store {
            store.set(PREFERENCE_KEY, lang.code());
        }
        self.current.set(lang);
    }

    pub fn signal(&self) -> Signal<Language> {
        self.current.clone()
    }

    /// Subscribe; called immediately with the current language.
    pub fn subscribe(&self, f: impl Fn(&Language) + 'static) -> SubscriptionId {
        self.current.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.current.unsubscribe(id)
    }
}

#[cfg(test)]
#[path = "../tests/unit/i18n/language.rs"]
mod tests;
