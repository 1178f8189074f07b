use std::io::Write;
use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::session::SessionReport;
use crate::stats::SampleSummary;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize, P: AsRef<Path>>(output_path: P, object: &T) -> std::io::Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned, P: AsRef<Path>>(file_path: P) -> std::io::Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[derive(serde::Serialize)]
struct RunReport<'a> {
    timestamp: String,
    input: String,
    run: &'a SessionReport,
    summary: &'a SampleSummary,
}

/// Writes the outcome of one run and its sample statistics as JSON.
pub fn write_run_report<P: AsRef<Path>>(
    output_path: P,
    input: &str,
    run: &SessionReport,
    summary: &SampleSummary,
) -> std::io::Result<()> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let report = RunReport {
        timestamp: now.format(&Rfc3339).map_err(std::io::Error::other)?,
        input: input.to_string(),
        run,
        summary,
    };
    object_to_json(output_path, &report)
}
