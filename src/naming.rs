//! Output file naming for one recording session

use std::path::PathBuf;

use crate::OutputConfig;

/// Resolves where a session's files live.
///
/// Hosts with their own storage layout provide an implementation; the
/// recorder only ever asks for these two paths.
pub trait OutputNaming: Send {
    /// Path of the append-only timestamp log
    fn timestamp_log(&self) -> PathBuf;

    /// Path of the still image for the frame with `timestamp`
    fn frame_image(&self, timestamp: i64) -> PathBuf;
}

/// Default layout: everything for a session under one root directory
#[derive(Debug, Clone)]
pub struct SessionNaming {
    root: PathBuf,
    session: String,
    timestamp_suffix: String,
    frames_dir_suffix: String,
}

impl SessionNaming {
    pub fn new(output: &OutputConfig, session: impl Into<String>) -> Self {
        Self {
            root: output.root.clone(),
            session: session.into(),
            timestamp_suffix: output.timestamp_suffix.clone(),
            frames_dir_suffix: output.frames_dir_suffix.clone(),
        }
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.root
            .join(format!("{}{}", self.session, self.frames_dir_suffix))
    }
}

impl OutputNaming for SessionNaming {
    fn timestamp_log(&self) -> PathBuf {
        self.root
            .join(format!("{}{}.csv", self.session, self.timestamp_suffix))
    }

    fn frame_image(&self, timestamp: i64) -> PathBuf {
        self.frames_dir().join(format!("{}.jpg", timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_layout() {
        let output = OutputConfig {
            root: PathBuf::from("/data/rec"),
            ..OutputConfig::default()
        };
        let naming = SessionNaming::new(&output, "20240101_120000");

        assert_eq!(
            naming.timestamp_log(),
            PathBuf::from("/data/rec/20240101_120000_timestamps.csv")
        );
        assert_eq!(
            naming.frame_image(1_234_567),
            PathBuf::from("/data/rec/20240101_120000_frames/1234567.jpg")
        );
    }

    #[test]
    fn test_negative_timestamp_keeps_sign() {
        let naming = SessionNaming::new(&OutputConfig::default(), "s");
        assert!(naming
            .frame_image(-5)
            .to_string_lossy()
            .ends_with("s_frames/-5.jpg"));
    }
}
