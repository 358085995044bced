use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared state between a relay stream and its downstream wrapper.
///
/// The relay marks the handle completed once it has written its terminal
/// frame; the wrapper cancels it when the body is dropped. A cancel that
/// arrives after completion is ignored, so only real client disconnects
/// are observed as cancellations.
#[derive(Clone, Default)]
pub struct StreamCancelHandle {
    cancelled: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
}

impl StreamCancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the stream as completed normally.
    pub fn mark_completed(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Signal cancellation. Returns `true` only for the call that actually
    /// cancelled a stream that had not completed.
    pub fn cancel(&self) -> bool {
        if self.is_completed() {
            return false;
        }
        self.cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_before_completion() {
        let handle = StreamCancelHandle::new();

        assert!(!handle.is_cancelled());
        assert!(handle.cancel());
        assert!(handle.is_cancelled());
        assert!(!handle.is_completed());
    }

    #[test]
    fn test_cancel_after_completion_is_ignored() {
        let handle = StreamCancelHandle::new();
        handle.mark_completed();

        assert!(!handle.cancel());
        assert!(handle.is_completed());
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn test_cancel_is_reported_once_across_clones() {
        let handle = StreamCancelHandle::new();
        let clone = handle.clone();

        assert!(handle.cancel());
        assert!(!clone.cancel());
        assert!(clone.is_cancelled());
    }
}
