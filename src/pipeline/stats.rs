//! Lock-free recorder counters

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::CachePadded;

/// Counters shared between the producer, the worker and the host.
///
/// Producer-side and worker-side counters sit on separate cache lines.
#[derive(Default)]
pub struct RecorderStats {
    producer: CachePadded<ProducerStats>,
    worker: CachePadded<WorkerStats>,
}

#[derive(Default)]
struct ProducerStats {
    frames_submitted: AtomicU64,
    frames_rejected: AtomicU64,
}

#[derive(Default)]
struct WorkerStats {
    frames_recorded: AtomicU64,
    images_written: AtomicU64,
    frames_discarded: AtomicU64,
}

/// Point-in-time copy of [`RecorderStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_submitted: u64,
    pub frames_rejected: u64,
    pub frames_recorded: u64,
    pub images_written: u64,
    pub frames_discarded: u64,
}

impl RecorderStats {
    pub(crate) fn submitted(&self) {
        self.producer
            .frames_submitted
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!("frameinfo.frames_submitted").increment(1);
    }

    pub(crate) fn rejected(&self) {
        self.producer.frames_rejected.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("frameinfo.frames_rejected").increment(1);
    }

    pub(crate) fn recorded(&self) {
        self.worker.frames_recorded.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("frameinfo.frames_recorded").increment(1);
    }

    pub(crate) fn image_written(&self) {
        self.worker.images_written.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("frameinfo.images_written").increment(1);
    }

    pub(crate) fn discarded(&self, count: u64) {
        self.worker
            .frames_discarded
            .fetch_add(count, Ordering::Relaxed);
        metrics::counter!("frameinfo.frames_discarded").increment(count);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_submitted: self.producer.frames_submitted.load(Ordering::Relaxed),
            frames_rejected: self.producer.frames_rejected.load(Ordering::Relaxed),
            frames_recorded: self.worker.frames_recorded.load(Ordering::Relaxed),
            images_written: self.worker.images_written.load(Ordering::Relaxed),
            frames_discarded: self.worker.frames_discarded.load(Ordering::Relaxed),
        }
    }
}
