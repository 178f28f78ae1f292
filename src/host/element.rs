use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::foundation::core::Rect;
use crate::foundation::error::{FolioError, FolioResult};

/// Shared handle to a host element.
pub type ElementRef = Rc<dyn Element>;

/// A UI element owned by the host view.
///
/// Components read geometry from it and write presentation to it. Handles are only held for the
/// lifetime of an animation instance or watch subscription.
pub trait Element {
    /// Stable identifier, used to route element resize notifications.
    fn id(&self) -> &str;
    /// Whether the element is mounted and can be written to.
    fn is_attached(&self) -> bool;
    /// Bounding box in viewport coordinates.
    fn bounding_rect(&self) -> Rect;
    /// Displayed text content.
    fn text(&self) -> String;
    fn set_text(&self, text: &str) -> FolioResult<()>;
    fn set_style(&self, property: &str, value: &str) -> FolioResult<()>;
    fn remove_style(&self, property: &str) -> FolioResult<()>;
}

#[derive(Debug)]
struct MemoryElementState {
    attached: bool,
    rect: Rect,
    text: String,
    styles: BTreeMap<String, String>,
    text_writes: Vec<String>,
    fail_writes: bool,
}

/// In-memory [`Element`] for tests, the CLI and server-side rendering.
#[derive(Debug)]
pub struct MemoryElement {
    id: String,
    state: RefCell<MemoryElementState>,
}

impl MemoryElement {
    /// Attached element with the given bounds.
    pub fn new(id: impl Into<String>, rect: Rect) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            state: RefCell::new(MemoryElementState {
                attached: true,
                rect,
                text: String::new(),
                styles: BTreeMap::new(),
                text_writes: Vec::new(),
                fail_writes: false,
            }),
        })
    }

    /// Element that is not mounted yet.
    pub fn detached(id: impl Into<String>, rect: Rect) -> Rc<Self> {
        let el = Self::new(id, rect);
        el.set_attached(false);
        el
    }

    pub fn set_attached(&self, attached: bool) {
        self.state.borrow_mut().attached = attached;
    }

    pub fn set_rect(&self, rect: Rect) {
        self.state.borrow_mut().rect = rect;
    }

    /// Make every subsequent write fail, simulating a broken engine or a torn-down node.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.state.borrow().styles.get(property).cloned()
    }

    pub fn styles(&self) -> BTreeMap<String, String> {
        self.state.borrow().styles.clone()
    }

    /// Every text value written so far, in order.
    pub fn text_writes(&self) -> Vec<String> {
        self.state.borrow().text_writes.clone()
    }

    fn check_writable(&self, what: &str) -> FolioResult<()> {
        let state = self.state.borrow();
        if state.fail_writes {
            return Err(FolioError::element(format!(
                "element '{}' rejected {what}",
                self.id
            )));
        }
        Ok(())
    }
}

impl Element for MemoryElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    fn bounding_rect(&self) -> Rect {
        self.state.borrow().rect
    }

    fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    fn set_text(&self, text: &str) -> FolioResult<()> {
        self.check_writable("text write")?;
        let mut state = self.state.borrow_mut();
        state.text = text.to_owned();
        state.text_writes.push(text.to_owned());
        Ok(())
    }

    fn set_style(&self, property: &str, value: &str) -> FolioResult<()> {
        self.check_writable("style write")?;
        self.state
            .borrow_mut()
            .styles
            .insert(property.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_style(&self, property: &str) -> FolioResult<()> {
        self.check_writable("style removal")?;
        self.state.borrow_mut().styles.remove(property);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/element.rs"]
mod tests;
