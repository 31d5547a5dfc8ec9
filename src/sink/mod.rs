pub mod still;
pub mod timestamp;

pub use still::{FrameImageSink, FrameSampler, JpegStillEncoder, StillEncoder};
pub use timestamp::{CsvTimestampLog, TimestampLog};
