//! Open → Draining → Closed

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use flume::Sender;

use crate::frame::FrameRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Accepting frames
    Open,
    /// No new frames; the worker is finishing what is queued
    Draining,
    /// Worker exited and sinks are closed. Terminal.
    Closed,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

/// Shared between the recorder handle and the worker.
///
/// Holds the only long-lived sender of the frame queue: once it is taken the
/// worker sees the queue disconnect after the backlog is consumed.
pub(crate) struct Lifecycle {
    intake: ArcSwapOption<Sender<FrameRecord>>,
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new(intake: Sender<FrameRecord>) -> Self {
        Self {
            intake: ArcSwapOption::from_pointee(intake),
            state: AtomicU8::new(LifecycleState::Open as u8),
        }
    }

    /// Sender for the next submission, `None` once shutdown has begun
    pub(crate) fn intake(&self) -> Option<Arc<Sender<FrameRecord>>> {
        self.intake.load_full()
    }

    /// Stop accepting frames. Returns false if shutdown had already begun.
    pub(crate) fn begin_shutdown(&self) -> bool {
        let had_intake = self.intake.swap(None).is_some();
        let _ = self.state.compare_exchange(
            LifecycleState::Open as u8,
            LifecycleState::Draining as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        had_intake
    }

    pub(crate) fn mark_closed(&self) {
        self.state
            .store(LifecycleState::Closed as u8, Ordering::Release);
    }

    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let (tx, rx) = flume::unbounded();
        let lifecycle = Lifecycle::new(tx);
        assert_eq!(lifecycle.state(), LifecycleState::Open);
        assert!(lifecycle.intake().is_some());

        assert!(lifecycle.begin_shutdown());
        assert_eq!(lifecycle.state(), LifecycleState::Draining);
        assert!(lifecycle.intake().is_none());
        assert!(rx.is_disconnected());

        assert!(!lifecycle.begin_shutdown());
        lifecycle.mark_closed();
        assert_eq!(lifecycle.state(), LifecycleState::Closed);

        assert!(!lifecycle.begin_shutdown());
        assert_eq!(lifecycle.state(), LifecycleState::Closed);
    }
}
