use std::path::PathBuf;

use thiserror::Error;

/// Reading a frame from an already opened source failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read frame {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame {index} is {got:?}, stream is {expected:?}")]
    SizeMismatch {
        index: usize,
        expected: (u32, u32),
        got: (u32, u32),
    },
}

/// The input cannot be used; the session is never created.
#[derive(Debug, Error)]
pub enum SourceOpenError {
    #[error("unable to open input {0}")]
    Missing(PathBuf),
    #[error("no frames found in {0}")]
    Empty(PathBuf),
    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("frame source yielded no first frame")]
    NoFirstFrame,
    #[error(transparent)]
    Read(#[from] SourceError),
}

/// No angle could be computed for a frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EstimationError {
    #[error("no features detected in previous frame")]
    NoFeatures,
    #[error("none of the {0} detected features could be tracked")]
    NoTrackedFeatures(usize),
    #[error("tracker answered {tracked} points for {features} features")]
    TrackLengthMismatch { features: usize, tracked: usize },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unable to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame is {got:?}, sink was opened for {expected:?}")]
    SizeMismatch { expected: (u32, u32), got: (u32, u32) },
    #[error("sink already finished")]
    Finished,
    #[error("rerun: {0}")]
    Rerun(#[from] rerun::RecordingStreamError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    SourceOpen(#[from] SourceOpenError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("frame {frame}: {source}")]
    Estimation {
        frame: usize,
        #[source]
        source: EstimationError,
    },
}
