pub mod decoder;
pub mod error;
pub mod frame;
pub mod naming;
pub mod phase;
pub mod pipeline;
pub mod recorder;
pub mod sink;
pub mod utils;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::{RecorderError, Result, SinkError};
pub use frame::{FrameRecord, ImagePayload, PixelFormat};
pub use naming::{OutputNaming, SessionNaming};
pub use phase::{PhaseChannel, PhaseEstimator, PhaseInfo};
pub use pipeline::{FailureHook, LifecycleState, StatsSnapshot};
pub use recorder::{FrameInfoRecorder, RecorderBuilder};
pub use sink::{CsvTimestampLog, JpegStillEncoder, StillEncoder, TimestampLog};

/// Environment variable prefix for overrides, e.g. `FRAMEINFO_RECORDER__SAVE_FRAMES=true`
pub const ENV_PREFIX: &str = "FRAMEINFO";

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recorder: RecorderConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Frames over which inter-frame durations are sampled for the phase report
    pub warmup_frames: u32,
    /// Every n-th frame is saved as an image when `save_frames` is set
    pub sampling_period: u32,
    pub save_frames: bool,
    pub jpeg_quality: u8,
    pub phase_channel_capacity: usize,
    /// CPU core to pin the frame worker to
    pub worker_core: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub root: PathBuf,
    pub timestamp_suffix: String,
    pub frames_dir_suffix: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            warmup_frames: 60,
            sampling_period: 60,
            save_frames: false,
            jpeg_quality: 100,
            phase_channel_capacity: 1,
            worker_core: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("recordings"),
            timestamp_suffix: "_timestamps".into(),
            frames_dir_suffix: "_frames".into(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply `FRAMEINFO_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let recorder = &self.recorder;
        if recorder.warmup_frames == 0 {
            return Err(RecorderError::InvalidConfig(
                "warmup_frames must be at least 1".into(),
            ));
        }
        if recorder.sampling_period == 0 {
            return Err(RecorderError::InvalidConfig(
                "sampling_period must be at least 1".into(),
            ));
        }
        if recorder.phase_channel_capacity == 0 {
            return Err(RecorderError::InvalidConfig(
                "phase_channel_capacity must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&recorder.jpeg_quality) {
            return Err(RecorderError::InvalidConfig(format!(
                "jpeg_quality must be within 1..=100, got {}",
                recorder.jpeg_quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.recorder.warmup_frames, 60);
        assert_eq!(config.recorder.sampling_period, 60);
        assert_eq!(config.recorder.jpeg_quality, 100);
        assert!(!config.recorder.save_frames);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frameinfo.toml");
        fs::write(
            &path,
            "[recorder]\nsave_frames = true\nsampling_period = 30\n\n[output]\nroot = \"/tmp/rec\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.recorder.save_frames);
        assert_eq!(config.recorder.sampling_period, 30);
        assert_eq!(config.recorder.warmup_frames, 60);
        assert_eq!(config.output.root, PathBuf::from("/tmp/rec"));
        assert_eq!(config.output.timestamp_suffix, "_timestamps");
    }

    #[test]
    fn test_rejects_zero_sampling_period() {
        let mut config = Config::default();
        config.recorder.sampling_period = 0;
        assert!(matches!(
            config.validate(),
            Err(RecorderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.recorder.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }
}
