//! Unbounded FIFO feeding exactly one dedicated worker thread

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, info, instrument, warn};

use super::lifecycle::{Lifecycle, LifecycleState};
use super::stats::RecorderStats;
use super::worker::FrameWorker;
use crate::error::{RecorderError, Result};
use crate::frame::FrameRecord;
use crate::utils;

const WORKER_THREAD_NAME: &str = "frame-info";

/// Serializes all per-frame work onto one background thread.
///
/// `submit` never blocks and never touches sink state; `shutdown` is the only
/// blocking call and waits for the backlog only.
pub struct FrameSequencer {
    lifecycle: Arc<Lifecycle>,
    stats: Arc<RecorderStats>,
    /// Held for the whole join so concurrent `shutdown` callers all wait
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl FrameSequencer {
    #[instrument(skip(build_worker, stats))]
    pub(crate) fn spawn<F>(
        build_worker: F,
        stats: Arc<RecorderStats>,
        worker_core: Option<usize>,
    ) -> Result<Self>
    where
        F: FnOnce(Arc<Lifecycle>) -> FrameWorker,
    {
        let (tx, rx) = flume::unbounded::<FrameRecord>();
        let lifecycle = Arc::new(Lifecycle::new(tx));
        let worker = build_worker(lifecycle.clone());

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || {
                if let Some(core) = worker_core {
                    utils::pin_current_thread(core);
                }
                worker.run(rx);
            })
            .map_err(RecorderError::Spawn)?;

        info!("Frame processor started");
        Ok(Self {
            lifecycle,
            stats,
            worker_id: handle.thread().id(),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Enqueue one frame for the worker. O(1), never blocks.
    pub fn submit(&self, frame: FrameRecord) -> Result<()> {
        let sent = match self.lifecycle.intake() {
            Some(intake) => intake.send(frame).is_ok(),
            None => false,
        };

        if sent {
            self.stats.submitted();
            Ok(())
        } else {
            self.stats.rejected();
            warn!("Received new frame after frame processor shutdown");
            Err(RecorderError::EnqueueAfterShutdown)
        }
    }

    /// Refuse new work, wait for the queued frames to be processed and the
    /// worker to exit. Every caller returns only once the worker is gone.
    ///
    /// From the worker itself (a failure hook closing the recorder) this only
    /// stops intake; the worker exits on its own after the hook returns.
    pub fn shutdown(&self) -> Result<()> {
        if self.lifecycle.begin_shutdown() {
            debug!("Attempting to shutdown frame processor");
        }

        if thread::current().id() == self.worker_id {
            return Ok(());
        }

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = worker.take() else {
            return Ok(());
        };

        handle.join().map_err(|_| {
            self.lifecycle.mark_closed();
            RecorderError::WorkerPanicked
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}

impl Drop for FrameSequencer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Frame processor shutdown failed: {}", e);
        }
    }
}
