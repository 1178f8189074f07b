use slip_angle::config::{FailedTrackPolicy, FlowConfig};
use slip_angle::sink::MemorySink;
use slip_angle::source::MemorySource;
use slip_angle::synthetic::{DriveConfig, drive_sequence};
use slip_angle::FlowSession;

fn estimated_angles(drive: &DriveConfig, config: FlowConfig) -> Vec<f64> {
    let source = MemorySource::new(drive_sequence(drive), 30.0);
    let mut session = FlowSession::configure(source, config, |_| Ok(MemorySink::default())).unwrap();
    let report = session.run().unwrap();
    assert_eq!(report.frames_processed, drive.frames - 1);
    session.samples().iter().map(|s| s.angle).collect()
}

#[test]
fn test_drive_directions() {
    for angle_deg in [0.0f32, 30.0, -45.0, 90.0, 150.0] {
        let drive = DriveConfig {
            frames: 4,
            angle_deg,
            speed: 4.0,
            seed: 11,
            ..Default::default()
        };
        let angles = estimated_angles(&drive, FlowConfig::default());
        assert_eq!(angles.len(), 3);
        for a in angles {
            assert!((a - angle_deg as f64).abs() < 5.0, "{} for {}", a, angle_deg);
        }
    }
}

#[test]
fn test_legacy_policy_on_clean_drive() {
    let drive = DriveConfig {
        frames: 3,
        angle_deg: 20.0,
        speed: 3.0,
        ..Default::default()
    };
    let mut config = FlowConfig::default();
    config.estimator.failed_tracks = FailedTrackPolicy::ZeroDisplacement;
    for a in estimated_angles(&drive, config) {
        assert!((a - 20.0).abs() < 5.0, "{}", a);
    }
}
