//! JSON output of the final record stream.
//!
//! The file is a single pretty-printed array of [`OutputRecord`]s, indented
//! with four spaces and with non-ASCII text written as-is:
//!
//! ```text
//! output_dir/
//! └── KBS_VIDEO_DATA.json
//! ```
//!
//! Field order is part of the downstream contract: `id, title,
//! cleaned_title, upload_date, description, cleaned_description, video_link,
//! thumbnail_link, view_count`.

use crate::models::{EnrichedRecord, OutputRecord};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize records into the persisted JSON form.
pub fn render_records(records: &[EnrichedRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let rows: Vec<OutputRecord> = records.iter().map(OutputRecord::from).collect();
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    rows.serialize(&mut ser)?;
    Ok(buf)
}

/// Write records to `{output_dir}/{file_name}`.
///
/// Creates `output_dir` when missing. The in-memory records are untouched on
/// failure, so the caller can still report them.
///
/// # Returns
///
/// The path written, or an error if serialization, directory creation or the
/// file write fails.
#[instrument(level = "info", skip(records), fields(count = records.len()))]
pub async fn write_records(
    records: &[EnrichedRecord],
    output_dir: &str,
    file_name: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = render_records(records)?;

    info!(%output_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = Path::new(output_dir).join(file_name);
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote video dataset");

    Ok(path)
}
