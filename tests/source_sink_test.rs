use image::{ColorType, ImageFormat, RgbImage};
use slip_angle::config::FlowConfig;
use slip_angle::session::StreamInfo;
use slip_angle::sink::{FrameSink, ImageSequenceSink, MANIFEST_FILE, MemorySink, SinkSettings};
use slip_angle::source::{FrameSource, ImageSequenceSource};
use slip_angle::synthetic::square_frame;
use slip_angle::{FlowSession, SinkError, SlipAngleSample, SourceError, SourceOpenError};
use tempfile::TempDir;

fn info(width: u32, height: u32) -> StreamInfo {
    StreamInfo {
        width,
        height,
        fps: 30.0,
        frame_count: None,
    }
}

fn write_frames(dir: &std::path::Path, frames: &[RgbImage]) {
    for (i, frame) in frames.iter().enumerate() {
        frame.save(dir.join(format!("{:06}.png", i))).unwrap();
    }
}

#[test]
fn test_image_sequence_in_name_order() {
    let temp_dir = TempDir::new().unwrap();
    let frames: Vec<RgbImage> = (0..3).map(|k| square_frame(64, 48, 10 + k, 10, 20)).collect();
    write_frames(temp_dir.path(), &frames);
    std::fs::write(temp_dir.path().join("notes.txt"), "not a frame").unwrap();

    let mut source = ImageSequenceSource::open(temp_dir.path(), 24.0).unwrap();
    assert_eq!(source.fps(), 24.0);
    assert_eq!(source.frame_count(), Some(3));
    for expected in &frames {
        assert_eq!(&source.next_frame().unwrap().unwrap(), expected);
    }
    assert!(source.next_frame().unwrap().is_none());
    assert!(source.next_frame().unwrap().is_none());
}

#[test]
fn test_missing_and_empty_folders() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope");
    assert!(matches!(
        ImageSequenceSource::open(&missing, 30.0),
        Err(SourceOpenError::Missing(_))
    ));
    assert!(matches!(
        ImageSequenceSource::open(temp_dir.path(), 30.0),
        Err(SourceOpenError::Empty(_))
    ));
}

#[test]
fn test_frame_size_change_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    write_frames(
        temp_dir.path(),
        &[square_frame(64, 48, 10, 10, 20), square_frame(32, 48, 10, 10, 10)],
    );
    let mut source = ImageSequenceSource::open(temp_dir.path(), 30.0).unwrap();
    assert!(source.next_frame().unwrap().is_some());
    match source.next_frame() {
        Err(SourceError::SizeMismatch {
            index,
            expected,
            got,
        }) => {
            assert_eq!(index, 1);
            assert_eq!(expected, (64, 48));
            assert_eq!(got, (32, 48));
        }
        other => panic!("unexpected {:?}", other.map(|f| f.map(|f| f.dimensions()))),
    }
}

#[test]
fn test_undecodable_frame() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("000000.png"), b"garbage").unwrap();
    let mut source = ImageSequenceSource::open(temp_dir.path(), 30.0).unwrap();
    assert!(matches!(source.next_frame(), Err(SourceError::Decode { .. })));
}

#[test]
fn test_image_sequence_sink_writes_frames_and_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let mut sink =
        ImageSequenceSink::create(SinkSettings::new(&out, ImageFormat::Png, &info(64, 48))).unwrap();
    let frame = square_frame(64, 48, 5, 5, 20);
    sink.write(&frame).unwrap();
    sink.write(&frame).unwrap();
    assert_eq!(sink.written(), 2);
    assert!(matches!(
        sink.write(&square_frame(10, 10, 0, 0, 1)),
        Err(SinkError::SizeMismatch { .. })
    ));
    sink.finish().unwrap();
    sink.finish().unwrap();
    assert!(matches!(sink.write(&frame), Err(SinkError::Finished)));

    assert!(out.join("000000.png").exists());
    assert_eq!(sink.frame_path(1), out.join("000001.png"));
    assert_eq!(image::open(sink.frame_path(1)).unwrap().to_rgb8(), frame);

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest["frames"], 2);
    assert_eq!(manifest["fps"], 30.0);
    assert_eq!(manifest["width"], 64);
    assert_eq!(manifest["format"], "png");
    assert_eq!(manifest["pattern"], "%06d.png");
}

#[test]
fn test_gray_output() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = SinkSettings::new(temp_dir.path(), ImageFormat::Png, &info(16, 16));
    settings.color = false;
    let mut sink = ImageSequenceSink::create(settings).unwrap();
    sink.write(&square_frame(16, 16, 4, 4, 8)).unwrap();
    let written = image::open(sink.frame_path(0)).unwrap();
    assert_eq!(written.color(), ColorType::L8);
}

#[test]
fn test_combined_sinks() {
    let frame = RgbImage::new(4, 4);
    let sample = SlipAngleSample {
        frame: 0,
        time: 0.0,
        angle: 12.0,
    };
    let mut sinks = (MemorySink::default(), Some(MemorySink::default()));
    sinks.write(&frame).unwrap();
    sinks.record_sample(&sample).unwrap();
    sinks.finish().unwrap();
    let disabled: Option<MemorySink> = None;
    let mut boxed: Box<dyn FrameSink> = Box::new(disabled);
    boxed.write(&frame).unwrap();
    boxed.finish().unwrap();

    let (a, b) = sinks;
    let b = b.unwrap();
    assert_eq!(a.frames.len(), 1);
    assert_eq!(b.samples, vec![sample]);
    assert!(a.finished && b.finished);
}

#[test]
fn test_folder_to_folder_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    std::fs::create_dir(&input).unwrap();
    let frames: Vec<RgbImage> = (0..4).map(|k| square_frame(120, 100, 30 + 4 * k, 26, 40)).collect();
    write_frames(&input, &frames);

    let source = ImageSequenceSource::open(&input, 30.0).unwrap();
    let mut session = FlowSession::configure(source, FlowConfig::default(), |info| {
        ImageSequenceSink::create(SinkSettings::new(&output, ImageFormat::Png, info))
    })
    .unwrap();
    let report = session.run().unwrap();
    assert_eq!(report.frames_processed, 3);
    assert_eq!(session.sink().written(), 3);
    assert!(output.join(MANIFEST_FILE).exists());
}
