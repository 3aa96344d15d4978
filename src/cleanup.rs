//! Scoped release actions, run last-registered-first.

/// Stack of release actions registered as resources are acquired.
///
/// Actions run in reverse registration order, either explicitly through
/// [`CleanupStack::run`] or when the stack is dropped. [`CleanupStack::disarm`]
/// forgets them once ownership of the resources has moved elsewhere.
#[derive(Default)]
pub struct CleanupStack<'a> {
    actions: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a> CleanupStack<'a> {
    pub fn new() -> Self {
        Self { actions: Vec::new() }
    }

    pub fn push(&mut self, action: impl FnOnce() + 'a) {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every pending action, newest first. The stack is empty afterwards.
    pub fn run(&mut self) {
        while let Some(action) = self.actions.pop() {
            action();
        }
    }

    /// Drop all pending actions without running them.
    pub fn disarm(mut self) {
        self.actions.clear();
    }
}

impl Drop for CleanupStack<'_> {
    fn drop(&mut self) {
        self.run();
    }
}
