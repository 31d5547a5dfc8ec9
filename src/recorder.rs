//! Frame info recording during video capture.
//!
//! The capture thread hands over one timestamp (and optionally an image) per
//! frame; everything else happens on the frame worker.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, instrument};

use crate::error::Result;
use crate::frame::{FrameRecord, ImagePayload, PixelFormat};
use crate::naming::{OutputNaming, SessionNaming};
use crate::phase::{PhaseChannel, PhaseEstimator};
use crate::pipeline::worker::FrameWorker;
use crate::pipeline::{FailureHook, FrameSequencer, LifecycleState, RecorderStats, StatsSnapshot};
use crate::sink::{CsvTimestampLog, FrameImageSink, JpegStillEncoder, StillEncoder, TimestampLog};
use crate::Config;

/// Records frame timestamps, sampled frame images, and the warm-up phase report
pub struct FrameInfoRecorder {
    sequencer: FrameSequencer,
    stats: Arc<RecorderStats>,
    phase_channel: PhaseChannel,
}

impl FrameInfoRecorder {
    pub fn builder(config: Config, session: impl Into<String>) -> RecorderBuilder {
        RecorderBuilder::new(config, session)
    }

    /// Timestamp-only frame
    pub fn submit_timestamp(&self, timestamp: i64) -> Result<()> {
        self.sequencer.submit(FrameRecord::timestamp_only(timestamp))
    }

    /// Frame with an image payload; the timestamp is recorded as for
    /// [`submit_timestamp`](Self::submit_timestamp)
    pub fn submit_timestamp_and_image(
        &self,
        timestamp: i64,
        data: Bytes,
        width: u32,
        height: u32,
        format: PixelFormat,
        rotation_degrees: i32,
    ) -> Result<()> {
        self.sequencer.submit(FrameRecord::with_image(
            timestamp,
            ImagePayload {
                data,
                width,
                height,
                format,
                rotation_degrees,
            },
        ))
    }

    /// Stop accepting frames and block until everything already submitted
    /// is written and the sinks are closed. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.sequencer.shutdown()
    }

    pub fn state(&self) -> LifecycleState {
        self.sequencer.state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn phase_channel(&self) -> &PhaseChannel {
        &self.phase_channel
    }
}

/// Wires the recorder's injected capabilities
pub struct RecorderBuilder {
    config: Config,
    session: String,
    naming: Option<Box<dyn OutputNaming>>,
    timestamp_log: Option<Box<dyn TimestampLog>>,
    encoder: Option<Box<dyn StillEncoder>>,
    phase_channel: Option<PhaseChannel>,
    on_failure: Option<FailureHook>,
}

impl RecorderBuilder {
    fn new(config: Config, session: impl Into<String>) -> Self {
        Self {
            config,
            session: session.into(),
            naming: None,
            timestamp_log: None,
            encoder: None,
            phase_channel: None,
            on_failure: None,
        }
    }

    /// Replace the default [`SessionNaming`] layout
    pub fn naming(mut self, naming: impl OutputNaming + 'static) -> Self {
        self.naming = Some(Box::new(naming));
        self
    }

    /// Use a ready-made timestamp log instead of opening one from the naming
    pub fn timestamp_log(mut self, log: impl TimestampLog + 'static) -> Self {
        self.timestamp_log = Some(Box::new(log));
        self
    }

    /// Replace the default [`JpegStillEncoder`]
    pub fn still_encoder(mut self, encoder: impl StillEncoder + 'static) -> Self {
        self.encoder = Some(Box::new(encoder));
        self
    }

    /// Host-owned phase channel; cleared when the recorder is built
    pub fn phase_channel(mut self, channel: PhaseChannel) -> Self {
        self.phase_channel = Some(channel);
        self
    }

    /// Runs once on the frame worker when recording fails. Calling
    /// [`FrameInfoRecorder::close`] from the hook only stops intake; it cannot
    /// wait for the worker it is running on.
    pub fn on_failure(mut self, hook: impl FnOnce(&crate::RecorderError) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(hook));
        self
    }

    #[instrument(skip(self), fields(session = %self.session))]
    pub fn build(self) -> Result<FrameInfoRecorder> {
        self.config.validate()?;
        let recorder = &self.config.recorder;

        let naming: Box<dyn OutputNaming> = match self.naming {
            Some(naming) => naming,
            None => Box::new(SessionNaming::new(&self.config.output, self.session.clone())),
        };

        let timestamps: Box<dyn TimestampLog> = match self.timestamp_log {
            Some(log) => log,
            None => Box::new(CsvTimestampLog::create(naming.timestamp_log())?),
        };

        let encoder: Box<dyn StillEncoder> = self
            .encoder
            .unwrap_or_else(|| Box::new(JpegStillEncoder::new(recorder.jpeg_quality)));

        let phase_channel = self
            .phase_channel
            .unwrap_or_else(|| PhaseChannel::bounded(recorder.phase_channel_capacity));
        let stale = phase_channel.clear();
        if stale > 0 {
            info!("Discarded {} stale phase reports", stale);
        }

        let images = FrameImageSink::new(
            recorder.save_frames,
            recorder.sampling_period,
            encoder,
            naming,
        );
        let phase = PhaseEstimator::new(recorder.warmup_frames);
        let stats = Arc::new(RecorderStats::default());

        let worker_channel = phase_channel.clone();
        let worker_stats = stats.clone();
        let on_failure = self.on_failure;
        let sequencer = FrameSequencer::spawn(
            move |lifecycle| {
                FrameWorker::new(
                    timestamps,
                    images,
                    phase,
                    worker_channel,
                    on_failure,
                    lifecycle,
                    worker_stats,
                )
            },
            stats.clone(),
            recorder.worker_core,
        )?;

        info!(
            save_frames = recorder.save_frames,
            warmup_frames = recorder.warmup_frames,
            sampling_period = recorder.sampling_period,
            "Frame info recorder ready"
        );

        Ok(FrameInfoRecorder {
            sequencer,
            stats,
            phase_channel,
        })
    }
}
