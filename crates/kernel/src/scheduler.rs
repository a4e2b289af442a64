/// At most one outstanding "run before next repaint" request.
///
/// The event loop asks [`is_pending`](Self::is_pending) before requesting a
/// redraw, and the frame handler [`take`](Self::take)s the request. Once
/// cancelled the scheduler ignores further requests for good.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
    cancelled: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a frame. Returns false if the scheduler has been cancelled.
    pub fn request(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.pending = true;
        true
    }

    /// Consume the pending request, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.pending = false;
        self.cancelled = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_then_take() {
        let mut s = FrameScheduler::new();
        assert!(!s.take());
        assert!(s.request());
        assert!(s.request());
        assert!(s.is_pending());
        assert!(s.take());
        assert!(!s.take());
    }

    #[test]
    fn cancel_is_permanent() {
        let mut s = FrameScheduler::new();
        s.request();
        s.cancel();
        assert!(!s.is_pending());
        assert!(!s.request());
        assert!(!s.take());
        assert!(s.is_cancelled());
    }
}
