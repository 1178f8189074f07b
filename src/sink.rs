use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, RgbImage};
use log::debug;
use serde::Serialize;

use crate::error::SinkError;
use crate::io::object_to_json;
use crate::session::StreamInfo;
use crate::types::SlipAngleSample;

/// Receives annotated frames, in the size of the source.
pub trait FrameSink {
    fn write(&mut self, frame: &RgbImage) -> Result<(), SinkError>;

    /// Called after the frame of a sample has been written.
    fn record_sample(&mut self, _sample: &SlipAngleSample) -> Result<(), SinkError> {
        Ok(())
    }

    /// Flushes whatever is needed for the output to be complete. Called
    /// once at the end of a session.
    fn finish(&mut self) -> Result<(), SinkError>;
}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn write(&mut self, frame: &RgbImage) -> Result<(), SinkError> {
        (**self).write(frame)
    }

    fn record_sample(&mut self, sample: &SlipAngleSample) -> Result<(), SinkError> {
        (**self).record_sample(sample)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// A disabled sink.
impl<T: FrameSink> FrameSink for Option<T> {
    fn write(&mut self, frame: &RgbImage) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.write(frame))
    }

    fn record_sample(&mut self, sample: &SlipAngleSample) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.record_sample(sample))
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.as_mut().map_or(Ok(()), |s| s.finish())
    }
}

/// Both sinks get every frame.
impl<A: FrameSink, B: FrameSink> FrameSink for (A, B) {
    fn write(&mut self, frame: &RgbImage) -> Result<(), SinkError> {
        self.0.write(frame)?;
        self.1.write(frame)
    }

    fn record_sample(&mut self, sample: &SlipAngleSample) -> Result<(), SinkError> {
        self.0.record_sample(sample)?;
        self.1.record_sample(sample)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.0.finish()?;
        self.1.finish()
    }
}

/// Where and how an output sequence is written.
#[derive(Debug, Clone, Serialize)]
pub struct SinkSettings {
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_format")]
    pub format: ImageFormat,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    /// Three channel output, otherwise frames are stored as luma.
    pub color: bool,
}

fn serialize_format<S: serde::Serializer>(format: &ImageFormat, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(format.extensions_str().first().copied().unwrap_or("bin"))
}

impl SinkSettings {
    pub fn new<P: Into<PathBuf>>(path: P, format: ImageFormat, info: &StreamInfo) -> SinkSettings {
        SinkSettings {
            path: path.into(),
            format,
            fps: info.fps,
            width: info.width,
            height: info.height,
            color: true,
        }
    }
}

#[derive(Serialize)]
struct SequenceManifest<'a> {
    #[serde(flatten)]
    settings: &'a SinkSettings,
    frames: usize,
    pattern: String,
}

pub const MANIFEST_FILE: &str = "sequence.json";

/// Numbered still frames in a folder plus a `sequence.json` manifest
/// carrying the frame rate, written on [`FrameSink::finish`].
pub struct ImageSequenceSink {
    settings: SinkSettings,
    written: usize,
    finished: bool,
}

impl ImageSequenceSink {
    pub fn create(settings: SinkSettings) -> Result<Self, SinkError> {
        std::fs::create_dir_all(&settings.path).map_err(|source| SinkError::Io {
            path: settings.path.clone(),
            source,
        })?;
        debug!(
            "writing {}x{} frames to {}",
            settings.width,
            settings.height,
            settings.path.display()
        );
        Ok(ImageSequenceSink {
            settings,
            written: 0,
            finished: false,
        })
    }

    fn extension(&self) -> &'static str {
        self.settings
            .format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("png")
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.settings
            .path
            .join(format!("{:06}.{}", index, self.extension()))
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for ImageSequenceSink {
    fn write(&mut self, frame: &RgbImage) -> Result<(), SinkError> {
        if self.finished {
            return Err(SinkError::Finished);
        }
        let expected = (self.settings.width, self.settings.height);
        if frame.dimensions() != expected {
            return Err(SinkError::SizeMismatch {
                expected,
                got: frame.dimensions(),
            });
        }
        let path = self.frame_path(self.written);
        let result = if self.settings.color {
            frame.save_with_format(&path, self.settings.format)
        } else {
            DynamicImage::ImageRgb8(frame.clone())
                .to_luma8()
                .save_with_format(&path, self.settings.format)
        };
        result.map_err(|source| SinkError::Encode { path, source })?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if self.finished {
            return Ok(());
        }
        let manifest = SequenceManifest {
            settings: &self.settings,
            frames: self.written,
            pattern: format!("%06d.{}", self.extension()),
        };
        let path = self.settings.path.join(MANIFEST_FILE);
        object_to_json(&path, &manifest).map_err(|source| SinkError::Io { path, source })?;
        self.finished = true;
        Ok(())
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
    pub samples: Vec<SlipAngleSample>,
    pub finished: bool,
}

impl FrameSink for MemorySink {
    fn write(&mut self, frame: &RgbImage) -> Result<(), SinkError> {
        if self.finished {
            return Err(SinkError::Finished);
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn record_sample(&mut self, sample: &SlipAngleSample) -> Result<(), SinkError> {
        self.samples.push(*sample);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
