//! Warm-up frame interval statistics and their hand-off to a consumer

use flume::{Receiver, Sender, TrySendError};
use tracing::{debug, info};

use crate::error::RecorderError;

/// One-time summary of early inter-frame timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseInfo {
    /// Timestamp of the frame that closed the warm-up window
    pub timestamp: i64,

    /// `t[i] - t[i-1]` for the frames inside the window, in arrival order
    pub durations: Vec<i64>,
}

/// Bounded queue of phase reports, owned by the host.
///
/// The recorder keeps a clone and only ever performs a non-blocking send.
#[derive(Debug, Clone)]
pub struct PhaseChannel {
    tx: Sender<PhaseInfo>,
    rx: Receiver<PhaseInfo>,
}

impl PhaseChannel {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self { tx, rx }
    }

    /// Consumer side; poll with `try_recv`, block with `recv` or await `recv_async`
    pub fn receiver(&self) -> Receiver<PhaseInfo> {
        self.rx.clone()
    }

    /// Discard any stale report left from a previous session
    pub fn clear(&self) -> usize {
        self.rx.drain().count()
    }

    /// Non-blocking, drop-on-full delivery
    pub fn offer(&self, info: PhaseInfo) -> Result<(), RecorderError> {
        match self.tx.try_send(info) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                Err(RecorderError::ChannelFull)
            }
        }
    }
}

/// Accumulates inter-frame durations over the warm-up window.
///
/// Lives on the worker only.
#[derive(Debug)]
pub struct PhaseEstimator {
    window: u64,
    frame_index: u64,
    last_timestamp: Option<i64>,
    durations: Vec<i64>,
}

impl PhaseEstimator {
    pub fn new(window: u32) -> Self {
        Self {
            window: window as u64,
            frame_index: 0,
            last_timestamp: None,
            durations: Vec::with_capacity(window.saturating_sub(1) as usize),
        }
    }

    /// Feed the next frame. Returns the report exactly once, at frame index `window`.
    pub fn observe(&mut self, timestamp: i64) -> Option<PhaseInfo> {
        if self.frame_index > self.window {
            return None;
        }

        let index = self.frame_index;
        self.frame_index += 1;

        if index < self.window {
            if let Some(last) = self.last_timestamp {
                let duration = timestamp - last;
                debug!("new frame duration, value: {}", duration);
                self.durations.push(duration);
            }
            self.last_timestamp = Some(timestamp);
            return None;
        }

        info!(
            "Phase window complete at timestamp {} ({} durations)",
            timestamp,
            self.durations.len()
        );
        Some(PhaseInfo {
            timestamp,
            durations: std::mem::take(&mut self.durations),
        })
    }

    pub fn is_complete(&self) -> bool {
        self.frame_index > self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_once_at_window_boundary() {
        let mut estimator = PhaseEstimator::new(4);
        let timestamps = [100, 133, 167, 200, 233, 267, 300];

        let reports: Vec<(usize, PhaseInfo)> = timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &t)| estimator.observe(t).map(|info| (i, info)))
            .collect();

        assert_eq!(reports.len(), 1);
        let (index, info) = &reports[0];
        assert_eq!(*index, 4);
        assert_eq!(info.timestamp, 233);
        assert_eq!(info.durations, vec![33, 34, 33]);
        assert!(estimator.is_complete());
    }

    #[test]
    fn test_short_stream_emits_nothing() {
        let mut estimator = PhaseEstimator::new(60);
        for i in 0..60 {
            assert!(estimator.observe(i * 16_666_666).is_none());
        }
        assert!(!estimator.is_complete());
    }

    #[test]
    fn test_zero_first_timestamp_is_still_a_frame() {
        let mut estimator = PhaseEstimator::new(3);
        estimator.observe(0);
        estimator.observe(10);
        estimator.observe(25);
        let info = estimator.observe(40).unwrap();
        assert_eq!(info.durations, vec![10, 15]);
    }

    #[test]
    fn test_window_of_one_has_no_durations() {
        let mut estimator = PhaseEstimator::new(1);
        assert!(estimator.observe(5).is_none());
        let info = estimator.observe(9).unwrap();
        assert_eq!(info.timestamp, 9);
        assert!(info.durations.is_empty());
        assert!(estimator.observe(12).is_none());
    }

    #[test]
    fn test_channel_drops_when_full() {
        let channel = PhaseChannel::bounded(1);
        let info = PhaseInfo {
            timestamp: 1,
            durations: vec![],
        };

        channel.offer(info.clone()).unwrap();
        assert!(matches!(
            channel.offer(info.clone()),
            Err(RecorderError::ChannelFull)
        ));
        assert_eq!(channel.receiver().try_recv().unwrap(), info);
    }

    #[test]
    fn test_clear_discards_stale_reports() {
        let channel = PhaseChannel::bounded(2);
        channel
            .offer(PhaseInfo {
                timestamp: 7,
                durations: vec![1],
            })
            .unwrap();
        assert_eq!(channel.clear(), 1);
        assert!(channel.receiver().try_recv().is_err());
    }
}
