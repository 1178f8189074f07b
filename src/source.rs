use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use glob::glob;
use image::{ImageReader, RgbImage};
use log::{debug, trace};

use crate::error::{SourceError, SourceOpenError};

/// Sequential frames of one recording.
pub trait FrameSource {
    fn fps(&self) -> f64;

    /// Total number of frames, if known. Only used for progress output.
    fn frame_count(&self) -> Option<usize>;

    /// Next frame, `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError>;
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg", ".jpeg"] {
            if p.as_os_str().to_string_lossy().to_lowercase().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Still frames in one folder, played back in file name order.
///
/// Zero padded names (`000001.png`) sort in frame order, which is what
/// `ffmpeg -i drive.mp4 frames/%06d.png` produces.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    fps: f64,
    frame_w_h: Option<(u32, u32)>,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(folder: P, fps: f64) -> Result<Self, SourceOpenError> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(SourceOpenError::Missing(folder.to_path_buf()));
        }
        let pattern = format!("{}/*", folder.display());
        let mut paths: Vec<PathBuf> = glob(&pattern)?.filter_map(img_filter).collect();
        if paths.is_empty() {
            return Err(SourceOpenError::Empty(folder.to_path_buf()));
        }
        paths.sort();
        debug!("{} frames in {}", paths.len(), folder.display());
        Ok(ImageSequenceSource {
            paths,
            cursor: 0,
            fps,
            frame_w_h: None,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSequenceSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<usize> {
        Some(self.paths.len())
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        trace!("decoding {}", path.display());
        let img = ImageReader::open(path)
            .map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?
            .decode()
            .map_err(|source| SourceError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();

        let got = img.dimensions();
        match self.frame_w_h {
            None => self.frame_w_h = Some(got),
            Some(expected) if expected != got => {
                return Err(SourceError::SizeMismatch {
                    index: self.cursor,
                    expected,
                    got,
                });
            }
            Some(_) => {}
        }
        self.cursor += 1;
        Ok(Some(img))
    }
}

/// Frames already in memory.
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
    total: usize,
    fps: f64,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>, fps: f64) -> MemorySource {
        MemorySource {
            total: frames.len(),
            frames: frames.into(),
            fps,
        }
    }
}

impl FrameSource for MemorySource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<usize> {
        Some(self.total)
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        Ok(self.frames.pop_front())
    }
}
