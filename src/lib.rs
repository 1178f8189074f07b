pub mod config;
pub mod detector;
pub mod error;
pub mod estimator;
pub mod export;
pub mod image_ops;
pub mod io;
pub mod render;
pub mod session;
pub mod sink;
pub mod source;
pub mod stats;
pub mod synthetic;
pub mod tracker;
pub mod types;
pub mod visualization;

pub use config::FlowConfig;
pub use error::{EstimationError, SessionError, SinkError, SourceError, SourceOpenError};
pub use estimator::{SlipAngleEstimate, estimate_slip_angle};
pub use session::{FlowSession, SessionReport, StepOutcome, StreamInfo};
pub use types::{FeatureSet, SlipAngleSample, TrackResult};
