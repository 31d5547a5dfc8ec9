//! The single consumer of the frame queue.
//!
//! All sink and estimator state lives here and is touched by nothing else,
//! so none of it needs a lock.

use std::sync::Arc;

use flume::Receiver;
use tracing::{debug, error, info, warn};

use super::lifecycle::Lifecycle;
use super::stats::RecorderStats;
use crate::error::{RecorderError, SinkError};
use crate::frame::FrameRecord;
use crate::phase::{PhaseChannel, PhaseEstimator};
use crate::sink::{FrameImageSink, TimestampLog};

/// Invoked at most once, when frame info recording has failed
pub type FailureHook = Box<dyn FnOnce(&RecorderError) + Send>;

pub(crate) struct FrameWorker {
    timestamps: Box<dyn TimestampLog>,
    images: FrameImageSink,
    phase: PhaseEstimator,
    phase_channel: PhaseChannel,
    on_failure: Option<FailureHook>,
    lifecycle: Arc<Lifecycle>,
    stats: Arc<RecorderStats>,
    frame_number: u64,
}

impl FrameWorker {
    pub(crate) fn new(
        timestamps: Box<dyn TimestampLog>,
        images: FrameImageSink,
        phase: PhaseEstimator,
        phase_channel: PhaseChannel,
        on_failure: Option<FailureHook>,
        lifecycle: Arc<Lifecycle>,
        stats: Arc<RecorderStats>,
    ) -> Self {
        Self {
            timestamps,
            images,
            phase,
            phase_channel,
            on_failure,
            lifecycle,
            stats,
            frame_number: 0,
        }
    }

    /// Process frames in submission order until the queue disconnects or a
    /// write fails, then close the sinks.
    pub(crate) fn run(mut self, queue: Receiver<FrameRecord>) {
        while let Ok(frame) = queue.recv() {
            let timestamp = frame.timestamp;
            if let Err(source) = self.process(frame) {
                self.fail(RecorderError::Recording { timestamp, source });
                break;
            }
        }

        self.close_sinks();

        // Intake is gone by now; this ends once in-flight submissions settle
        let discarded = queue.iter().count() as u64;
        if discarded > 0 {
            warn!("Discarded {} queued frames after recording failure", discarded);
            self.stats.discarded(discarded);
        }

        self.lifecycle.mark_closed();
        info!("Frame processor stopped, frame number: {}", self.frame_number);
    }

    fn process(&mut self, frame: FrameRecord) -> Result<(), SinkError> {
        self.timestamps.append(frame.timestamp)?;

        if let Some(path) = self.images.maybe_write(frame.timestamp, frame.image.as_ref())? {
            debug!("Frame image written: {:?}", path);
            self.stats.image_written();
        }

        if let Some(info) = self.phase.observe(frame.timestamp) {
            if let Err(e) = self.phase_channel.offer(info) {
                debug!("Phase report not delivered: {}", e);
            }
        }

        self.frame_number += 1;
        self.stats.recorded();
        Ok(())
    }

    fn fail(&mut self, err: RecorderError) {
        error!("{}", err);
        if let RecorderError::Recording { source, .. } = &err {
            error!("Cause: {}", source);
        }

        self.lifecycle.begin_shutdown();
        if let Some(hook) = self.on_failure.take() {
            hook(&err);
        }
    }

    fn close_sinks(&mut self) {
        debug!("Closing frame info, frame number: {}", self.frame_number);
        if !self.phase.is_complete() {
            info!("Closed before the phase window completed, no phase report");
        }
        if let Err(e) = self.timestamps.close() {
            warn!("Failed to close timestamp log: {}", e);
        }
    }
}
