//! Per-frame debounce.

/// Admits at most one action per render frame.
///
/// Guards against input that is bound twice and fires twice in one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDebounce {
    last_frame: Option<u64>,
}

impl FrameDebounce {
    /// Debounce that admits the next action.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no action has been admitted in `frame` yet.
    pub fn try_enter(&mut self, frame: u64) -> bool {
        if self.last_frame == Some(frame) {
            tracing::trace!(frame, "Debounced repeat action within frame");
            return false;
        }
        self.last_frame = Some(frame);
        true
    }

    /// Frame of the last admitted action.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_action_per_frame() {
        let mut debounce = FrameDebounce::new();
        assert!(debounce.try_enter(10));
        assert!(!debounce.try_enter(10));
        assert!(debounce.try_enter(11));
        assert_eq!(debounce.last_frame(), Some(11));
    }
}
