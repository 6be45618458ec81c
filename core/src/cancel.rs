//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation request shared between the signal side and a blocked call.
///
/// The loop creates one token per dispatched statement. Whoever receives the
/// interrupt calls [`CancelToken::cancel`]; long-running gateway calls poll
/// [`CancelToken::is_cancelled`] and give up at the next opportunity.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        // GIVEN
        let token = CancelToken::new();
        let observer = token.clone();

        // WHEN
        token.cancel();

        // THEN
        assert!(observer.is_cancelled());
    }
}
