//! View-state controller.
//!
//! [`ViewState`] is owned here and changed only through the transitions on
//! [`Controller`]; renderers read it through [`Controller::state`]. Backend
//! errors never escape: they become a user-facing message in
//! [`ViewState::error`] and the previous outcome is kept.
//!
//! Every submission takes a [`Ticket`] from a monotonic counter. A reply is
//! applied only if its ticket is still the latest one, so a slow reply can
//! not overwrite the result of a newer request (or a reset).

use crate::error::{PubSummaryError, Result};
use crate::model::{FacultyResult, SearchOutcome};
use crate::normalize::{normalize, RequestKind};
use crate::transport::{Backend, DownloadFormat, RawReply, RosterFile};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const MSG_MISSING_NAME: &str = "Please enter an author name";
pub const MSG_MISSING_FILE: &str = "Please select a file to upload";
pub const MSG_SINGLE_FAILED: &str =
    "An error occurred while searching for the author. Please try again.";
pub const MSG_BULK_FAILED: &str =
    "An error occurred while processing the file. Please try again.";
pub const MSG_SINGLE_EMPTY: &str =
    "No data found for the given author. Please check the name and institution.";
pub const MSG_BULK_EMPTY: &str = "No results found in the uploaded file.";
pub const MSG_DOWNLOAD_FAILED: &str = "An error occurred while downloading the file.";

/// Result tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Single,
    Bulk,
}

impl Tab {
    pub fn index(self) -> usize {
        match self {
            Tab::Single => 0,
            Tab::Bulk => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Tab::Single),
            1 => Some(Tab::Bulk),
            _ => None,
        }
    }
}

/// Everything the renderer needs to draw the screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub outcome: SearchOutcome,
    pub active_tab: Tab,
    /// Selected faculty while the outcome is `Bulk`
    pub active_faculty_index: usize,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ViewState {
    /// Whether the given tab has data (a tab without data is disabled).
    pub fn tab_enabled(&self, tab: Tab) -> bool {
        matches!(
            (tab, &self.outcome),
            (Tab::Single, SearchOutcome::Single(_)) | (Tab::Bulk, SearchOutcome::Bulk(_))
        )
    }

    /// Faculty result currently on screen, if any.
    pub fn active_faculty(&self) -> Option<&FacultyResult> {
        match (&self.outcome, self.active_tab) {
            (SearchOutcome::Single(result), Tab::Single) => Some(result),
            (SearchOutcome::Bulk(results), Tab::Bulk) => results.get(self.active_faculty_index),
            _ => None,
        }
    }
}

/// Handle for an in-flight request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    id: u64,
    request: RequestKind,
}

impl Ticket {
    pub fn request(&self) -> &RequestKind {
        &self.request
    }
}

/// Owns the view state and drives the backend
pub struct Controller<B> {
    backend: B,
    state: ViewState,
    latest_ticket: u64,
}

impl<B: Backend> Controller<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: ViewState::default(),
            latest_ticket: 0,
        }
    }

    /// Read-only snapshot for rendering
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ------------------------------------------------------------------
    // Submissions
    // ------------------------------------------------------------------

    /// Run a single-author search to completion.
    pub async fn submit_single(&mut self, name: &str, institution: Option<&str>) {
        let Ok(ticket) = self.begin_single(name) else {
            return;
        };
        let institution = institution.map(str::trim).filter(|i| !i.is_empty());
        let reply = self.backend.search_author(name.trim(), institution).await;
        self.apply_reply(ticket, reply);
    }

    /// Run a roster upload to completion.
    pub async fn submit_bulk(&mut self, file: Option<RosterFile>) {
        let Ok(ticket) = self.begin_bulk(file.as_ref()) else {
            return;
        };
        if let Some(file) = file {
            let reply = self.backend.upload_roster(&file).await;
            self.apply_reply(ticket, reply);
        }
    }

    /// Read a roster from disk and upload it. Unreadable or unsupported
    /// files are reported like any other validation failure.
    pub async fn submit_bulk_path(&mut self, path: Option<&Path>) {
        let file = match path {
            Some(path) => match RosterFile::from_path(path).await {
                Ok(file) => Some(file),
                Err(e) => {
                    self.fail_before_request(&e, &RequestKind::Bulk);
                    return;
                }
            },
            None => None,
        };
        self.submit_bulk(file).await;
    }

    /// Validate a single search and mark it in flight.
    pub fn begin_single(&mut self, name: &str) -> Result<Ticket> {
        let name = name.trim();
        let request = RequestKind::Single {
            name: name.to_string(),
        };
        if name.is_empty() {
            let err = PubSummaryError::Validation(MSG_MISSING_NAME.to_string());
            self.fail_before_request(&err, &request);
            return Err(err);
        }
        Ok(self.issue_ticket(request))
    }

    /// Validate a roster upload and mark it in flight.
    pub fn begin_bulk(&mut self, file: Option<&RosterFile>) -> Result<Ticket> {
        if file.is_none() {
            let err = PubSummaryError::Validation(MSG_MISSING_FILE.to_string());
            self.fail_before_request(&err, &RequestKind::Bulk);
            return Err(err);
        }
        Ok(self.issue_ticket(RequestKind::Bulk))
    }

    /// Apply a backend reply. Returns `false` when the ticket is stale and
    /// the reply was dropped.
    pub fn apply_reply(&mut self, ticket: Ticket, reply: Result<RawReply>) -> bool {
        if ticket.id != self.latest_ticket {
            debug!(
                ticket = ticket.id,
                latest = self.latest_ticket,
                "Dropping stale reply"
            );
            return false;
        }

        self.state.is_loading = false;
        match reply.and_then(|raw| normalize(&raw, &ticket.request)) {
            Ok(outcome) => self.show(outcome),
            Err(e) => {
                warn!(error = %e, "Request failed");
                self.state.error = Some(user_message(&e, &ticket.request));
            }
        }
        true
    }

    fn issue_ticket(&mut self, request: RequestKind) -> Ticket {
        self.latest_ticket += 1;
        self.state.is_loading = true;
        self.state.error = None;
        Ticket {
            id: self.latest_ticket,
            request,
        }
    }

    fn fail_before_request(&mut self, err: &PubSummaryError, request: &RequestKind) {
        debug!(error = %err, "Rejected before request");
        self.state.error = Some(user_message(err, request));
        self.state.is_loading = false;
    }

    fn show(&mut self, outcome: SearchOutcome) {
        match &outcome {
            SearchOutcome::Single(result) => {
                info!(
                    name = %result.profile.name,
                    publications = result.publications.len(),
                    "Showing single result"
                );
                self.state.active_tab = Tab::Single;
            }
            SearchOutcome::Bulk(results) => {
                info!(faculty = results.len(), "Showing bulk results");
                self.state.active_tab = Tab::Bulk;
                self.state.active_faculty_index = 0;
            }
            SearchOutcome::Empty => {}
        }
        self.state.outcome = outcome;
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Switch tabs. Returns `false` (and changes nothing) when the tab has
    /// no data.
    pub fn select_tab(&mut self, tab: Tab) -> bool {
        if !self.state.tab_enabled(tab) {
            return false;
        }
        self.state.active_tab = tab;
        true
    }

    /// Select a faculty member of the bulk result set.
    pub fn select_faculty(&mut self, index: usize) -> Result<()> {
        let SearchOutcome::Bulk(results) = &self.state.outcome else {
            return Err(PubSummaryError::Validation(
                "No bulk results to select from".to_string(),
            ));
        };
        if index >= results.len() {
            return Err(PubSummaryError::Validation(format!(
                "Faculty index {} out of range (0..{})",
                index,
                results.len()
            )));
        }
        self.state.active_faculty_index = index;
        Ok(())
    }

    /// Back to the empty search screen. Replies still in flight are dropped.
    pub fn reset(&mut self) {
        self.latest_ticket += 1;
        self.state = ViewState::default();
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    /// Fetch the backend's export into `dest_dir`.
    ///
    /// Best-effort: failures are logged and shown as a generic message, and
    /// never touch the outcome, the tabs or the loading flag.
    pub async fn download(&mut self, format: DownloadFormat, dest_dir: &Path) -> Option<PathBuf> {
        match self.fetch_export(format, dest_dir).await {
            Ok(path) => {
                info!(path = %path.display(), "Saved export");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, format = format.as_param(), "Download failed");
                self.state.error = Some(MSG_DOWNLOAD_FAILED.to_string());
                None
            }
        }
    }

    async fn fetch_export(&self, format: DownloadFormat, dest_dir: &Path) -> Result<PathBuf> {
        let export = self.backend.download(format).await?;
        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(&export.file_name);
        tokio::fs::write(&path, &export.bytes).await?;
        Ok(path)
    }
}

/// Fold an error into the message shown to the user.
pub fn user_message(err: &PubSummaryError, request: &RequestKind) -> String {
    let bulk = matches!(request, RequestKind::Bulk);
    match err {
        PubSummaryError::Validation(message) => message.clone(),
        PubSummaryError::NoResults(_) if bulk => MSG_BULK_EMPTY.to_string(),
        PubSummaryError::NoResults(_) => MSG_SINGLE_EMPTY.to_string(),
        other => match other.backend_message() {
            Some(message) => message.to_string(),
            None if bulk => MSG_BULK_FAILED.to_string(),
            None => MSG_SINGLE_FAILED.to_string(),
        },
    }
}
