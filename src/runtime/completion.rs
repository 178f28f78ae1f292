use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct CompletionInner {
    resolved: bool,
    waiters: Vec<Box<dyn FnOnce()>>,
}

/// One-shot completion handle shared between a producer and any number of waiters.
///
/// It resolves at most once and never fails. Cancelled work resolves too, so nothing is left
/// waiting on a superseded animation.
#[derive(Clone, Default)]
pub struct Completion {
    inner: Rc<RefCell<CompletionInner>>,
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Completion")
            .field("resolved", &inner.resolved)
            .field("waiters", &inner.waiters.len())
            .finish()
    }
}

impl Completion {
    /// New unresolved completion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completion that is already resolved.
    pub fn resolved() -> Self {
        let c = Self::new();
        c.resolve();
        c
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().resolved
    }

    /// Resolve and run the waiters. Returns `false` if it was already resolved.
    pub fn resolve(&self) -> bool {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            if inner.resolved {
                return false;
            }
            inner.resolved = true;
            std::mem::take(&mut inner.waiters)
        };
        for w in waiters {
            w();
        }
        true
    }

    /// Run `f` once resolved; immediately if that already happened.
    pub fn then(&self, f: impl FnOnce() + 'static) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.resolved {
                inner.waiters.push(Box::new(f));
                return;
            }
        }
        f();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/completion.rs"]
mod tests;
