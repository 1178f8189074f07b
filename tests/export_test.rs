use std::io::BufRead;

use slip_angle::SlipAngleSample;
use slip_angle::export::{CSV_HEADER, save_csv, write_csv};
use tempfile::TempDir;

fn samples() -> Vec<SlipAngleSample> {
    vec![
        SlipAngleSample {
            frame: 0,
            time: 0.031,
            angle: 1.5,
        },
        SlipAngleSample {
            frame: 1,
            time: 0.064,
            angle: -2.25,
        },
        SlipAngleSample {
            frame: 3,
            time: 0.12,
            angle: 0.0,
        },
    ]
}

fn parse_row(line: &str) -> (usize, f64, f64) {
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();
    assert_eq!(cols.len(), 3, "row {}", line);
    (
        cols[0].parse().unwrap(),
        cols[1].parse().unwrap(),
        cols[2].parse().unwrap(),
    )
}

#[test]
fn test_three_samples_give_four_lines() {
    let mut out = Vec::new();
    write_csv(&mut out, &samples()).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Frame, Angle (deg), Time (s)");
    assert_eq!(lines[0], CSV_HEADER);
    for (line, s) in lines[1..].iter().zip(samples()) {
        assert_eq!(parse_row(line), (s.frame, s.angle, s.time));
    }
}

#[test]
fn test_empty_history_is_header_only() {
    let mut out = Vec::new();
    write_csv(&mut out, &[]).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", CSV_HEADER));
}

#[test]
fn test_save_csv() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("angles.csv");
    save_csv(&path, &samples()).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let lines: Vec<String> = std::io::BufReader::new(file)
        .lines()
        .map(|l| l.unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(parse_row(&lines[2]), (1, -2.25, 0.064));
}

#[test]
fn test_save_csv_into_missing_dir_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("no").join("such").join("angles.csv");
    assert!(save_csv(&path, &samples()).is_err());
}
