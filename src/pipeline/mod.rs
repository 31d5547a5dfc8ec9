pub mod lifecycle;
pub mod sequencer;
pub mod stats;
pub mod worker;

pub use lifecycle::LifecycleState;
pub use sequencer::FrameSequencer;
pub use stats::{RecorderStats, StatsSnapshot};
pub use worker::FailureHook;
