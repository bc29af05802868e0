//! Turn backend replies into [`SearchOutcome`]s.
//!
//! JSON replies are read directly. HTML replies are scraped:
//!
//! - single document: `.profile-details` heading/paragraph for the profile,
//!   every `tbody tr` with at least four `td` cells for publications
//! - bulk document: `.faculty-tab` / `.faculty-content` pairs in document
//!   order, each content block parsed like a single document
//!
//! Photos and indices only ever come from JSON.

use crate::error::{PubSummaryError, Result, ResultExt};
use crate::model::{FacultyResult, Profile, Publication, SearchOutcome};
use crate::transport::RawReply;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

/// Which request produced the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Single-author search, carrying the searched name as profile fallback
    Single { name: String },
    /// Roster upload
    Bulk,
}

/// Normalize a backend reply for the given request.
///
/// Yields `Single` for single searches and a non-empty `Bulk` for uploads;
/// anything that produces no records is `NoResults`.
pub fn normalize(reply: &RawReply, request: &RequestKind) -> Result<SearchOutcome> {
    let outcome = match (reply, request) {
        (RawReply::Json(value), RequestKind::Single { name }) => {
            SearchOutcome::Single(single_from_json(value, name)?)
        }
        (RawReply::Json(value), RequestKind::Bulk) => SearchOutcome::Bulk(bulk_from_json(value)?),
        (RawReply::Html(html), RequestKind::Single { name }) => {
            SearchOutcome::Single(single_from_html(html, name)?)
        }
        (RawReply::Html(html), RequestKind::Bulk) => SearchOutcome::Bulk(bulk_from_html(html)?),
    };

    info!(faculty = outcome.faculty().len(), "Normalized backend reply");
    Ok(outcome)
}

// ============================================================================
// JSON
// ============================================================================

/// Read `{profile, results | publications}`.
pub fn single_from_json(value: &Value, searched_name: &str) -> Result<FacultyResult> {
    let Some(profile) = value.get("profile").filter(|p| p.is_object()) else {
        return Err(no_results("reply has no profile"));
    };

    let mut result = FacultyResult {
        profile: serde_json::from_value(profile.clone())?,
        publications: publications_from_json(value)?,
    };
    fill_name(&mut result.profile, searched_name);
    Ok(result)
}

/// Read `{faculty_results: [...]}`.
pub fn bulk_from_json(value: &Value) -> Result<Vec<FacultyResult>> {
    let Some(items) = value.get("faculty_results").and_then(Value::as_array) else {
        return Err(no_results("reply has no faculty_results"));
    };

    let results = items
        .iter()
        .enumerate()
        .map(|(i, item)| -> Result<FacultyResult> {
            let mut result = serde_json::from_value::<FacultyResult>(item.clone())?;
            fill_name(&mut result.profile, &format!("Faculty {}", i + 1));
            Ok(result)
        })
        .collect::<Result<Vec<_>>>()?;

    if results.is_empty() {
        return Err(no_results("faculty_results is empty"));
    }
    Ok(results)
}

fn publications_from_json(value: &Value) -> Result<Vec<Publication>> {
    let list = ["results", "publications"]
        .iter()
        .find_map(|key| value.get(*key).filter(|v| v.is_array()));

    match list {
        Some(list) => Ok(serde_json::from_value(list.clone())?),
        None => Ok(Vec::new()),
    }
}

// ============================================================================
// HTML
// ============================================================================

/// Compiled selectors for the backend's result templates
struct Selectors {
    profile_block: Selector,
    heading: Selector,
    paragraph: Selector,
    row: Selector,
    cell: Selector,
    faculty_tab: Selector,
    faculty_content: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        let parse = |css: &str| Selector::parse(css).or_config("Invalid selector");
        Ok(Self {
            profile_block: parse(".profile-details")?,
            heading: parse("h1, h2, h3, h4")?,
            paragraph: parse("p")?,
            row: parse("table tbody tr")?,
            cell: parse("td")?,
            faculty_tab: parse(".faculty-tab")?,
            faculty_content: parse(".faculty-content")?,
        })
    }
}

/// Scrape a single-author results page.
pub fn single_from_html(html: &str, searched_name: &str) -> Result<FacultyResult> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);
    let result = extract_faculty(&selectors, document.root_element(), searched_name);

    if result.publications.is_empty() {
        return Err(no_results("no publication rows in document"));
    }
    Ok(result)
}

/// Scrape a bulk results page.
pub fn bulk_from_html(html: &str) -> Result<Vec<FacultyResult>> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);

    let tabs: Vec<ElementRef> = document.select(&selectors.faculty_tab).collect();
    let contents: Vec<ElementRef> = document.select(&selectors.faculty_content).collect();
    if tabs.len() != contents.len() {
        debug!(
            tabs = tabs.len(),
            contents = contents.len(),
            "Unbalanced faculty blocks, ignoring the unmatched tail"
        );
    }

    let results: Vec<FacultyResult> = tabs
        .iter()
        .zip(contents.iter())
        .enumerate()
        .map(|(i, (tab, content))| {
            let mut result = extract_faculty(&selectors, *content, &element_text(*tab));
            fill_name(&mut result.profile, &format!("Faculty {}", i + 1));
            result
        })
        .collect();

    if results.is_empty() {
        return Err(no_results("no faculty blocks in document"));
    }
    Ok(results)
}

fn extract_faculty(selectors: &Selectors, scope: ElementRef, fallback_name: &str) -> FacultyResult {
    let details = scope.select(&selectors.profile_block).next();

    let name = details
        .and_then(|d| d.select(&selectors.heading).next())
        .map(element_text)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback_name.trim().to_string());
    let affiliation = details
        .and_then(|d| d.select(&selectors.paragraph).next())
        .map(element_text)
        .unwrap_or_default();

    let publications = scope
        .select(&selectors.row)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&selectors.cell).map(element_text).collect();
            match cells.as_slice() {
                [title, year, kind, venue, ..] => Some(Publication::new(
                    title.as_str(),
                    year.as_str(),
                    kind.as_str(),
                    venue.as_str(),
                )),
                _ => None,
            }
        })
        .collect();

    FacultyResult {
        profile: Profile::named(name, affiliation),
        publications,
    }
}

/// Text content of an element with whitespace runs collapsed.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn fill_name(profile: &mut Profile, searched_name: &str) {
    if profile.name.trim().is_empty() {
        profile.name = searched_name.trim().to_string();
    }
}

fn no_results(reason: &str) -> PubSummaryError {
    debug!(reason = reason, "Reply produced no results");
    PubSummaryError::NoResults(reason.to_string())
}
