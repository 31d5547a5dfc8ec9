//! Sampled still images of recorded frames

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use tracing::{debug, instrument};

use crate::decoder;
use crate::error::SinkError;
use crate::frame::ImagePayload;
use crate::naming::OutputNaming;

/// Turns a raw payload into encoded still-image bytes
pub trait StillEncoder: Send {
    fn encode(&mut self, payload: &ImagePayload) -> Result<Vec<u8>, SinkError>;
}

/// Decode, rotate, and JPEG-encode
#[derive(Debug, Clone)]
pub struct JpegStillEncoder {
    quality: u8,
}

impl JpegStillEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegStillEncoder {
    fn default() -> Self {
        Self::new(100)
    }
}

impl StillEncoder for JpegStillEncoder {
    fn encode(&mut self, payload: &ImagePayload) -> Result<Vec<u8>, SinkError> {
        let bitmap = decoder::decode_frame(payload)?;
        let rotated = rotate(bitmap, payload.rotation_degrees)?;

        let mut out = Vec::with_capacity(rotated.as_raw().len() / 4);
        JpegEncoder::new_with_quality(&mut out, self.quality).encode_image(&rotated)?;
        Ok(out)
    }
}

/// Clockwise rotation by a multiple of 90 degrees
pub fn rotate(bitmap: RgbImage, degrees: i32) -> Result<RgbImage, SinkError> {
    let rotated = match degrees.rem_euclid(360) {
        0 => bitmap,
        90 => imageops::rotate90(&bitmap),
        180 => imageops::rotate180(&bitmap),
        270 => imageops::rotate270(&bitmap),
        _ => return Err(SinkError::UnsupportedRotation(degrees)),
    };
    Ok(rotated)
}

/// Selects every `period`-th frame, starting with the first.
///
/// Counts independently of the phase warm-up.
#[derive(Debug)]
pub struct FrameSampler {
    period: u64,
    frame_index: u64,
}

impl FrameSampler {
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1) as u64,
            frame_index: 0,
        }
    }

    /// Advance by one frame; true if this frame is selected
    pub fn next_frame(&mut self) -> bool {
        let selected = self.frame_index % self.period == 0;
        self.frame_index += 1;
        selected
    }
}

/// Persists sampled frames as still images
pub struct FrameImageSink {
    enabled: bool,
    sampler: FrameSampler,
    encoder: Box<dyn StillEncoder>,
    naming: Box<dyn OutputNaming>,
    written: u64,
}

impl FrameImageSink {
    pub fn new(
        enabled: bool,
        sampling_period: u32,
        encoder: Box<dyn StillEncoder>,
        naming: Box<dyn OutputNaming>,
    ) -> Self {
        Self {
            enabled,
            sampler: FrameSampler::new(sampling_period),
            encoder,
            naming,
            written: 0,
        }
    }

    /// Called once per frame, image or not, so the sampling index stays aligned
    /// with the frame sequence. Returns the written path when the frame was selected.
    #[instrument(skip(self, image), level = "trace")]
    pub fn maybe_write(
        &mut self,
        timestamp: i64,
        image: Option<&ImagePayload>,
    ) -> Result<Option<PathBuf>, SinkError> {
        let selected = self.sampler.next_frame();
        let Some(image) = image else {
            return Ok(None);
        };
        if !self.enabled || !selected {
            return Ok(None);
        }

        debug!("Should save frame, timestamp: {}", timestamp);
        let encoded = self.encoder.encode(image)?;
        let path = self.naming.frame_image(timestamp);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = BufWriter::new(File::create(&path)?);
        file.write_all(&encoded)?;
        file.flush()?;

        self.written += 1;
        Ok(Some(path))
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;
    use crate::naming::SessionNaming;
    use crate::OutputConfig;
    use bytes::Bytes;
    use tempfile::tempdir;

    fn rgb_payload(width: u32, height: u32, rotation_degrees: i32) -> ImagePayload {
        ImagePayload {
            data: Bytes::from(vec![200u8; (width * height * 3) as usize]),
            width,
            height,
            format: PixelFormat::Rgb24,
            rotation_degrees,
        }
    }

    #[test]
    fn test_sampler_selects_multiples_of_period() {
        let mut sampler = FrameSampler::new(3);
        let selected: Vec<u64> = (0..10).filter(|_| sampler.next_frame()).collect();
        assert_eq!(selected, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_rotation_normalises_degrees() {
        let bitmap = RgbImage::new(4, 2);
        assert_eq!(rotate(bitmap.clone(), 90).unwrap().dimensions(), (2, 4));
        assert_eq!(rotate(bitmap.clone(), -90).unwrap().dimensions(), (2, 4));
        assert_eq!(rotate(bitmap.clone(), 540).unwrap().dimensions(), (4, 2));
        assert!(matches!(
            rotate(bitmap, 45),
            Err(SinkError::UnsupportedRotation(45))
        ));
    }

    #[test]
    fn test_rotation_is_clockwise() {
        let mut bitmap = RgbImage::new(2, 1);
        bitmap.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        let rotated = rotate(bitmap, 90).unwrap();
        // Left pixel ends up on top after a clockwise quarter turn
        assert_eq!(rotated.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(rotated.get_pixel(0, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_jpeg_encoder_applies_rotation() {
        let mut encoder = JpegStillEncoder::default();
        let bytes = encoder.encode(&rgb_payload(8, 4, 270)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 8));
    }

    #[test]
    fn test_sink_writes_only_sampled_frames_when_enabled() {
        let dir = tempdir().unwrap();
        let output = OutputConfig {
            root: dir.path().to_path_buf(),
            ..OutputConfig::default()
        };
        let naming = SessionNaming::new(&output, "s");
        let frames_dir = naming.frames_dir();

        let mut sink = FrameImageSink::new(
            true,
            2,
            Box::new(JpegStillEncoder::default()),
            Box::new(naming),
        );
        let payload = rgb_payload(4, 4, 0);
        for ts in 0..5 {
            sink.maybe_write(ts * 10, Some(&payload)).unwrap();
        }

        let mut names: Vec<String> = fs::read_dir(&frames_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["0.jpg", "20.jpg", "40.jpg"]);
        assert_eq!(sink.written(), 3);
    }

    #[test]
    fn test_disabled_sink_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = OutputConfig {
            root: dir.path().to_path_buf(),
            ..OutputConfig::default()
        };
        let mut sink = FrameImageSink::new(
            false,
            1,
            Box::new(JpegStillEncoder::default()),
            Box::new(SessionNaming::new(&output, "s")),
        );
        let payload = rgb_payload(2, 2, 0);
        assert!(sink.maybe_write(1, Some(&payload)).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_frames_without_image_still_advance_sampler() {
        let dir = tempdir().unwrap();
        let output = OutputConfig {
            root: dir.path().to_path_buf(),
            ..OutputConfig::default()
        };
        let mut sink = FrameImageSink::new(
            true,
            2,
            Box::new(JpegStillEncoder::default()),
            Box::new(SessionNaming::new(&output, "s")),
        );
        let payload = rgb_payload(2, 2, 0);

        assert!(sink.maybe_write(0, None).unwrap().is_none());
        assert!(sink.maybe_write(1, Some(&payload)).unwrap().is_none());
        assert!(sink.maybe_write(2, Some(&payload)).unwrap().is_some());
    }
}
