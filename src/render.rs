//! Terminal rendering of the view state.
//!
//! Pure functions from model to text; nothing here decides anything beyond
//! what to show.

use crate::controller::{Tab, ViewState};
use crate::model::{FacultyResult, Profile, Publication, SearchOutcome};
use std::fmt::Write;

/// Column cap for the title column; longer titles are cut with an ellipsis
const MAX_TITLE_WIDTH: usize = 60;
/// Column cap for the venue column
const MAX_VENUE_WIDTH: usize = 40;

/// Profile card: photo line (or initial placeholder), name, affiliation and
/// the index pair when both indices are known.
pub fn profile_card(profile: &Profile) -> String {
    let mut out = String::new();

    match profile.photo.as_deref() {
        Some(photo) => {
            let _ = writeln!(out, "Photo: {}", photo);
        }
        None => {
            let initial = profile
                .name
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_else(|| "?".to_string());
            let _ = writeln!(out, "[{}]", initial);
        }
    }

    let _ = writeln!(out, "{}", profile.name);
    if !profile.affiliation.is_empty() {
        let _ = writeln!(out, "{}", profile.affiliation);
    }
    if let Some((h_index, i10_index)) = profile.indices() {
        let _ = writeln!(out, "h-index: {}, i10-index: {}", h_index, i10_index);
    }
    out
}

/// Publication table with Title / Year / Type / Venue columns.
pub fn publication_table(publications: &[Publication]) -> String {
    if publications.is_empty() {
        return "No publications found.\n".to_string();
    }

    let rows: Vec<[String; 4]> = publications
        .iter()
        .map(|p| {
            [
                truncate(&p.title, MAX_TITLE_WIDTH),
                p.year.clone(),
                p.kind.clone(),
                truncate(&p.venue, MAX_VENUE_WIDTH),
            ]
        })
        .collect();

    let header = ["Title", "Year", "Type", "Venue"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

/// Tab strip listing every faculty member, marking the active one.
pub fn faculty_tabs(results: &[FacultyResult], active: usize) -> String {
    let labels: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if i == active {
                format!("[{}: {}]", i, f.profile.name)
            } else {
                format!(" {}: {} ", i, f.profile.name)
            }
        })
        .collect();
    format!("{}\n", labels.join(" "))
}

/// Full screen: error box, loading line, tabs and the active result.
pub fn view(state: &ViewState) -> String {
    let mut out = String::new();

    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {}", error);
    }
    if state.is_loading {
        let _ = writeln!(out, "Searching...");
    }
    if state.outcome.is_empty() {
        return out;
    }

    let tab_label = |tab: Tab, label: &str| {
        if !state.tab_enabled(tab) {
            format!("({})", label)
        } else if state.active_tab == tab {
            format!("[{}]", label)
        } else {
            format!(" {} ", label)
        }
    };
    let _ = writeln!(
        out,
        "{} {}",
        tab_label(Tab::Single, "Single Author"),
        tab_label(Tab::Bulk, "Bulk Results")
    );
    let _ = writeln!(out);

    if let (SearchOutcome::Bulk(results), Tab::Bulk) = (&state.outcome, state.active_tab) {
        out.push_str(&faculty_tabs(results, state.active_faculty_index));
        let _ = writeln!(out);
    }
    if let Some(faculty) = state.active_faculty() {
        out.push_str(&faculty_result(faculty));
    }
    out
}

/// Profile card followed by the publication table.
pub fn faculty_result(result: &FacultyResult) -> String {
    format!(
        "{}\nPublications\n{}",
        profile_card(&result.profile),
        publication_table(&result.publications)
    )
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
