use image::RgbImage;
use rerun::{RecordingStream, TimeCell};

use crate::error::SinkError;
use crate::sink::FrameSink;
use crate::types::SlipAngleSample;

/// Logs annotated frames and the angle series to a rerun recording, both on
/// the `frame` timeline.
pub struct RerunSink {
    recording: RecordingStream,
    topic: String,
    frame_idx: i64,
}

impl RerunSink {
    pub fn new(recording: RecordingStream, topic: &str) -> RerunSink {
        RerunSink {
            recording,
            topic: topic.to_string(),
            frame_idx: 0,
        }
    }
}

pub fn log_frame(
    recording: &RecordingStream,
    topic: &str,
    frame: &RgbImage,
) -> Result<(), SinkError> {
    recording.log(
        format!("{}/image", topic),
        &rerun::Image::from_rgb24(frame.as_raw().clone(), [frame.width(), frame.height()]),
    )?;
    Ok(())
}

impl FrameSink for RerunSink {
    fn write(&mut self, frame: &RgbImage) -> Result<(), SinkError> {
        self.recording
            .set_time("frame", TimeCell::from_sequence(self.frame_idx));
        log_frame(&self.recording, &self.topic, frame)?;
        self.frame_idx += 1;
        Ok(())
    }

    fn record_sample(&mut self, sample: &SlipAngleSample) -> Result<(), SinkError> {
        self.recording
            .set_time("frame", TimeCell::from_sequence(sample.frame as i64));
        self.recording
            .log("slip_angle", &rerun::Scalars::single(sample.angle))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.recording.flush_blocking();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_recording_accepts_a_run() {
        let mut sink = RerunSink::new(RecordingStream::disabled(), "/cam0");
        sink.write(&RgbImage::new(8, 6)).unwrap();
        sink.record_sample(&SlipAngleSample {
            frame: 0,
            time: 0.0,
            angle: 3.0,
        })
        .unwrap();
        sink.finish().unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.frame_idx, 1);
    }
}
