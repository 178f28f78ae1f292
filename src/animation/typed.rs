use crate::foundation::core::Millis;
use crate::host::element::ElementRef;

/// Style property carrying the cursor glyph while a cursor-enabled instance is alive.
pub const CURSOR_STYLE: &str = "--typed-cursor";

/// Per-target typing options.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TypedOptions {
    /// Delay between two revealed characters.
    pub type_speed_ms: u64,
    /// Extra wait before the first character.
    pub start_delay_ms: u64,
    pub show_cursor: bool,
    pub cursor_char: String,
}

impl Default for TypedOptions {
    fn default() -> Self {
        Self {
            type_speed_ms: 70,
            start_delay_ms: 0,
            show_cursor: false,
            cursor_char: "|".to_owned(),
        }
    }
}

/// One element plus the text to type into it.
#[derive(Clone)]
pub struct AnimationTarget {
    /// Key of the instance; a second animation with the same id preempts the first.
    pub target_id: String,
    pub element: ElementRef,
    pub text: String,
    pub options: TypedOptions,
}

impl std::fmt::Debug for AnimationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationTarget")
            .field("target_id", &self.target_id)
            .field("element", &self.element.id())
            .field("text", &self.text)
            .field("options", &self.options)
            .finish()
    }
}

impl AnimationTarget {
    pub fn new(target_id: impl Into<String>, element: ElementRef, text: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            element,
            text: text.into(),
            options: TypedOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TypedOptions) -> Self {
        self.options = options;
        self
    }

    pub fn type_speed(mut self, ms: u64) -> Self {
        self.options.type_speed_ms = ms;
        self
    }

    pub fn show_cursor(mut self, show: bool) -> Self {
        self.options.show_cursor = show;
        self
    }
}

/// Lifecycle notifications published by the animator.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// The element is attached and the first character is about to be typed.
    Started { target_id: String, at: Millis },
    /// The whole text is on screen; completion follows after the settle delay.
    Revealed { target_id: String, at: Millis },
    Completed { target_id: String, at: Millis },
    /// Destroyed before completing.
    Cancelled { target_id: String, at: Millis },
    /// The engine failed; the instance counts as completed.
    Failed {
        target_id: String,
        at: Millis,
        message: String,
    },
}

impl AnimationEvent {
    pub fn target_id(&self) -> &str {
        match self {
            Self::Started { target_id, .. }
            | Self::Revealed { target_id, .. }
            | Self::Completed { target_id, .. }
            | Self::Cancelled { target_id, .. }
            | Self::Failed { target_id, .. } => target_id,
        }
    }

    pub fn at(&self) -> Millis {
        match self {
            Self::Started { at, .. }
            | Self::Revealed { at, .. }
            | Self::Completed { at, .. }
            | Self::Cancelled { at, .. }
            | Self::Failed { at, .. } => *at,
        }
    }
}

/// Text visible after `n` characters have been typed. Counts Unicode scalar values so
/// multi-byte characters are never split.
pub(crate) fn typed_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
