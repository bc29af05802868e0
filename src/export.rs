//! Local CSV export of the results on screen.
//!
//! Uses the same column layout as the backend's combined download, one row
//! per publication tagged with its faculty member.

use crate::error::Result;
use crate::model::SearchOutcome;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One CSV row
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ExportRow {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Venue")]
    pub venue: String,
    #[serde(rename = "Faculty")]
    pub faculty: String,
    #[serde(rename = "Faculty_Institution")]
    pub faculty_institution: String,
}

/// Flatten an outcome into export rows, in display order.
pub fn rows(outcome: &SearchOutcome) -> Vec<ExportRow> {
    outcome
        .faculty()
        .iter()
        .flat_map(|faculty| {
            faculty.publications.iter().map(|p| ExportRow {
                title: p.title.clone(),
                year: p.year.clone(),
                kind: p.kind.clone(),
                venue: p.venue.clone(),
                faculty: faculty.profile.name.clone(),
                faculty_institution: faculty.profile.affiliation.clone(),
            })
        })
        .collect()
}

/// Write the outcome to `path` as CSV. Returns the number of rows written.
pub fn save_csv(path: &Path, outcome: &SearchOutcome) -> Result<usize> {
    let rows = rows(outcome);

    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    if rows.is_empty() {
        wtr.write_record([
            "Title",
            "Year",
            "Type",
            "Venue",
            "Faculty",
            "Faculty_Institution",
        ])?;
    }
    for row in &rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Saved CSV");
    Ok(rows.len())
}
