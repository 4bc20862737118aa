//! Scroll source capability
//!
//! The momentum source and the native-scroll fallback are interchangeable
//! behind [`ScrollSource`]; which one drives an engine is decided once at
//! setup from the reduced-motion signal.

use std::fmt;

use super::geometry::ScrollSnapshot;

/// Listener invoked with every scroll update
pub type ScrollListener = Box<dyn FnMut(ScrollSnapshot)>;

/// Which source an engine should subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Momentum,
    Native,
}

impl SourceKind {
    pub fn select(reduced_motion: bool) -> Self {
        if reduced_motion {
            SourceKind::Native
        } else {
            SourceKind::Momentum
        }
    }
}

/// Something that emits scroll positions
pub trait ScrollSource {
    /// Start delivering updates. Dropping the returned handle unsubscribes.
    fn subscribe(&mut self, listener: ScrollListener) -> Subscription;
}

/// Unsubscribe handle; the teardown runs exactly once, on `cancel` or drop
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to release
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    pub fn cancel(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}
