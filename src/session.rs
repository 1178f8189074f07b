//! One pass over one recording.
//!
//! A [`FlowSession`] exists from the moment the first frame has been read.
//! Each [`FlowSession::step`] consumes one more frame, estimates the slip
//! angle between it and the previous frame, and writes the annotated frame to
//! the sink. Once the source runs dry the session is finished and stays so.

use std::time::Instant;

use image::{GrayImage, RgbImage};
use indicatif::ProgressBar;
use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::config::{FlowConfig, TimeBase};
use crate::detector::{FeatureDetector, GoodFeatures};
use crate::error::{EstimationError, SessionError, SinkError, SourceError, SourceOpenError};
use crate::estimator::estimate_slip_angle;
use crate::image_ops::to_gray;
use crate::render;
use crate::sink::FrameSink;
use crate::source::FrameSource;
use crate::tracker::{MotionTracker, PyramidalLk};
use crate::types::SlipAngleSample;

/// Geometry and timing of the input, known once the first frame is read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: Option<usize>,
}

impl StreamInfo {
    /// Media time of frame `idx`; frame index itself when the rate is unknown.
    pub fn frame_time(&self, idx: usize) -> f64 {
        if self.fps > 0.0 {
            idx as f64 / self.fps
        } else {
            idx as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// First frame read, no step taken yet.
    Ready,
    Stepping,
    /// Source exhausted.
    Finished,
}

/// Result of one [`FlowSession::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Sample(SlipAngleSample),
    /// The frame was written without a sample.
    Skipped(EstimationError),
    Finished,
}

impl StepOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, StepOutcome::Finished)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    pub frames_processed: usize,
    pub samples: usize,
    pub skipped: usize,
    pub elapsed_sec: f64,
}

pub struct FlowSession<S, K, D = GoodFeatures, T = PyramidalLk> {
    source: S,
    sink: K,
    detector: D,
    tracker: T,
    config: FlowConfig,
    info: StreamInfo,
    prev_frame: RgbImage,
    prev_gray: GrayImage,
    frame_num: usize,
    start: Instant,
    samples: Vec<SlipAngleSample>,
    skipped: usize,
    state: SessionState,
    sink_closed: bool,
    progress: Option<ProgressBar>,
}

impl<S: FrameSource, K: FrameSink> FlowSession<S, K> {
    /// Reads the first frame and opens the sink for the stream it describes.
    pub fn configure<F>(source: S, config: FlowConfig, open_sink: F) -> Result<Self, SessionError>
    where
        F: FnOnce(&StreamInfo) -> Result<K, SinkError>,
    {
        let detector = GoodFeatures::new(config.detector.clone());
        let tracker = PyramidalLk::new(config.tracker.clone());
        FlowSession::configure_with(source, detector, tracker, config, open_sink)
    }
}

impl<S, K, D, T> FlowSession<S, K, D, T>
where
    S: FrameSource,
    K: FrameSink,
    D: FeatureDetector,
    T: MotionTracker,
{
    /// [`FlowSession::configure`] with a custom detector and tracker.
    pub fn configure_with<F>(
        mut source: S,
        detector: D,
        tracker: T,
        config: FlowConfig,
        open_sink: F,
    ) -> Result<Self, SessionError>
    where
        F: FnOnce(&StreamInfo) -> Result<K, SinkError>,
    {
        let first = source
            .next_frame()
            .map_err(SourceOpenError::from)?
            .ok_or(SourceOpenError::NoFirstFrame)?;
        if first.width() == 0 || first.height() == 0 {
            return Err(SourceOpenError::NoFirstFrame.into());
        }
        let info = StreamInfo {
            width: first.width(),
            height: first.height(),
            fps: source.fps(),
            frame_count: source.frame_count(),
        };
        debug!(
            "stream {}x{} @ {:.2} fps, {:?} frames",
            info.width, info.height, info.fps, info.frame_count
        );
        let sink = open_sink(&info)?;

        Ok(FlowSession {
            source,
            sink,
            detector,
            tracker,
            config,
            info,
            prev_gray: to_gray(&first),
            prev_frame: first,
            frame_num: 0,
            start: Instant::now(),
            samples: Vec::new(),
            skipped: 0,
            state: SessionState::Ready,
            sink_closed: false,
            progress: None,
        })
    }

    /// Advances a progress bar once per processed frame.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn samples(&self) -> &[SlipAngleSample] {
        &self.samples
    }

    /// Frame pairs processed so far.
    pub fn frame_num(&self) -> usize {
        self.frame_num
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The last frame read, unannotated.
    pub fn previous_frame(&self) -> &RgbImage {
        &self.prev_frame
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    fn sample_time(&self, elapsed: f64) -> f64 {
        match self.config.session.time_base {
            TimeBase::Wall => elapsed,
            TimeBase::Media => self.info.frame_time(self.frame_num),
        }
    }

    /// Processes the next frame.
    ///
    /// A frame pair without any usable feature is written unannotated and
    /// reported as [`StepOutcome::Skipped`], or fails the step when the
    /// session is strict. After the source is exhausted every call returns
    /// [`StepOutcome::Finished`] without touching any state.
    pub fn step(&mut self) -> Result<StepOutcome, SessionError> {
        if self.state == SessionState::Finished {
            return Ok(StepOutcome::Finished);
        }
        let elapsed = self.start.elapsed().as_secs_f64();

        let Some(frame) = self.source.next_frame()? else {
            debug!("source exhausted after {} frames", self.frame_num);
            self.state = SessionState::Finished;
            return Ok(StepOutcome::Finished);
        };
        self.state = SessionState::Stepping;
        let expected = (self.info.width, self.info.height);
        if frame.dimensions() != expected {
            return Err(SourceError::SizeMismatch {
                index: self.frame_num + 1,
                expected,
                got: frame.dimensions(),
            }
            .into());
        }
        let gray = to_gray(&frame);

        let features = self.detector.detect(&self.prev_gray);
        let track = self.tracker.track(&self.prev_gray, &gray, &features);
        trace!(
            "frame {}: {} features, {} tracked",
            self.frame_num,
            features.len(),
            track.tracked_count()
        );

        let mut annotated = frame.clone();
        let outcome = match estimate_slip_angle(&features, &track, &self.config.estimator) {
            Ok(estimate) => {
                let sample = SlipAngleSample {
                    frame: self.frame_num,
                    time: self.sample_time(elapsed),
                    angle: estimate.angle,
                };
                self.samples.push(sample);
                render::annotate(&mut annotated, &features, &estimate, &self.config.render);
                StepOutcome::Sample(sample)
            }
            Err(source) if self.config.session.strict => {
                return Err(SessionError::Estimation {
                    frame: self.frame_num,
                    source,
                });
            }
            Err(err) => {
                warn!("frame {}: {}, no sample", self.frame_num, err);
                self.skipped += 1;
                StepOutcome::Skipped(err)
            }
        };

        self.sink.write(&annotated)?;
        if let StepOutcome::Sample(sample) = &outcome {
            self.sink.record_sample(sample)?;
        }

        self.prev_gray = gray;
        self.prev_frame = frame;
        self.frame_num += 1;
        self.report_progress();
        Ok(outcome)
    }

    fn report_progress(&self) {
        if let Some(progress) = &self.progress {
            progress.inc(1);
        }
        let interval = self.config.session.progress_interval;
        if interval == 0 || self.frame_num % interval != 0 {
            return;
        }
        match self.info.frame_count {
            Some(total) => info!("{}/{} frames processed", self.frame_num, total),
            None => info!("{} frames processed", self.frame_num),
        }
    }

    /// Finishes the sink. Later calls do nothing.
    pub fn close(&mut self) -> Result<(), SinkError> {
        if !self.sink_closed {
            self.sink.finish()?;
            self.sink_closed = true;
        }
        Ok(())
    }

    /// Steps until the source is exhausted, then closes the sink.
    pub fn run(&mut self) -> Result<SessionReport, SessionError> {
        while !self.step()?.is_finished() {}
        self.close()?;
        if let Some(progress) = &self.progress {
            progress.finish();
        }
        Ok(self.report())
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            frames_processed: self.frame_num,
            samples: self.samples.len(),
            skipped: self.skipped,
            elapsed_sec: self.start.elapsed().as_secs_f64(),
        }
    }

    /// Sample history and sink, ending the session.
    pub fn into_parts(self) -> (Vec<SlipAngleSample>, K) {
        (self.samples, self.sink)
    }
}
