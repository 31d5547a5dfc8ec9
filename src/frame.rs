use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One unit of per-frame work travelling from the producer to the worker.
///
/// The sequence index is implicit: it is the position of the record in the
/// submission order, and only the worker ever counts it.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Sensor timestamp, nanosecond scale
    pub timestamp: i64,

    /// Raw image, present only for frames submitted with a payload
    pub image: Option<ImagePayload>,
}

impl FrameRecord {
    pub fn timestamp_only(timestamp: i64) -> Self {
        Self {
            timestamp,
            image: None,
        }
    }

    pub fn with_image(timestamp: i64, image: ImagePayload) -> Self {
        Self {
            timestamp,
            image: Some(image),
        }
    }
}

/// Raw pixel buffer as handed over by the capture pipeline
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Immutable pixel data - shared with the producer without copying
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,

    /// Clockwise rotation to apply before encoding
    pub rotation_degrees: i32,
}

/// Pixel formats we support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb24,
    Bgr24,
    Yuyv4,
    Mjpeg,
    Nv12,
    /// YUV420 semi-planar with interleaved V/U, the usual camera preview layout
    Nv21,
}
