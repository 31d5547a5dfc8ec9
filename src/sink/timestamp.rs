//! Append-only timestamp log

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{RecorderError, SinkError};

/// Destination for one timestamp per frame.
///
/// Only the frame worker calls these methods.
pub trait TimestampLog: Send {
    fn append(&mut self, timestamp: i64) -> Result<(), SinkError>;

    /// Flush and release the handle; a second call must be a no-op
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Single unlabeled column of decimal timestamps, one per line
pub struct CsvTimestampLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: u64,
}

impl CsvTimestampLog {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let path = path.as_ref().to_path_buf();
        let open = |path: &Path| -> std::io::Result<File> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            File::create(path)
        };
        let file = open(&path).map_err(|source| RecorderError::Open {
            path: path.clone(),
            source,
        })?;

        info!("Timestamp log opened: {:?}", path);
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            lines: 0,
        })
    }
}

impl TimestampLog for CsvTimestampLog {
    fn append(&mut self, timestamp: i64) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        writeln!(writer, "{}", timestamp)?;
        self.lines += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(mut writer) = self.writer.take() else {
            debug!("Timestamp log already closed");
            return Ok(());
        };

        writer.flush()?;
        writer.get_ref().sync_data()?;
        info!("Timestamp log closed after {} lines: {:?}", self.lines, self.path);
        Ok(())
    }
}

impl Drop for CsvTimestampLog {
    fn drop(&mut self) {
        if self.writer.is_some() {
            if let Err(e) = self.close() {
                warn!("Failed to flush timestamp log on drop: {}", e);
            }
        }
    }
}
