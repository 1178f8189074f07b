use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{Terminator, WriterBuilder};

use crate::types::SlipAngleSample;

pub const CSV_HEADER: &str = "Frame, Angle (deg), Time (s)";

const HEADER_RECORD: [&str; 3] = ["Frame", " Angle (deg)", " Time (s)"];

/// Header line, then one `frame,angle,time` row per sample in the given
/// order. Floats are written in their shortest exact form.
pub fn write_csv<W: Write>(writer: W, samples: &[SlipAngleSample]) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    wtr.write_record(HEADER_RECORD)?;
    for s in samples {
        wtr.write_record([s.frame.to_string(), s.angle.to_string(), s.time.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_csv<P: AsRef<Path>>(output_path: P, samples: &[SlipAngleSample]) -> csv::Result<()> {
    let file = std::fs::File::create(output_path)?;
    write_csv(BufWriter::new(file), samples)
}

/// Pretty JSON array of samples.
pub fn samples_to_json(samples: &[SlipAngleSample]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_fields() {
        let samples = [SlipAngleSample {
            frame: 4,
            time: 0.5,
            angle: -3.25,
        }];
        let back: Vec<SlipAngleSample> =
            serde_json::from_str(&samples_to_json(&samples).unwrap()).unwrap();
        assert_eq!(back, samples);
    }
}
