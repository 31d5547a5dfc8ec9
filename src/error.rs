use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the recorder
#[derive(Debug, Error)]
pub enum RecorderError {
    /// A frame arrived after `close()` began or after a recording failure
    #[error("frame submitted after the frame processor was shut down")]
    EnqueueAfterShutdown,

    /// The phase report could not be handed to the consumer
    #[error("phase report dropped, channel is full")]
    ChannelFull,

    /// A worker-side write failed; fatal to the session
    #[error("failed to write frame info, timestamp: {timestamp}")]
    Recording {
        timestamp: i64,
        #[source]
        source: SinkError,
    },

    #[error("failed to open {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn frame worker")]
    Spawn(#[source] io::Error),

    #[error("frame worker panicked")]
    WorkerPanicked,
}

/// Failure of a single sink operation on the worker
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("cannot decode {format:?} frame: {reason}")]
    Decode {
        format: crate::PixelFormat,
        reason: String,
    },

    #[error("unsupported rotation: {0} degrees")]
    UnsupportedRotation(i32),

    #[error("sink already closed")]
    Closed,
}

pub type Result<T, E = RecorderError> = std::result::Result<T, E>;
