//! HTTP client for the publication backend.
//!
//! Three calls: a form-encoded single-author search, a multipart roster
//! upload (both `POST <base>/`, the backend tells them apart by payload), and
//! the export download `GET <base>/download?format=..`. The reply shape
//! (JSON or HTML) is decided here, once, and handed on as a [`RawReply`].

use crate::config::Config;
use crate::error::{PubSummaryError, Result, ResultExt};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Accept header sent with every request: JSON preferred, HTML tolerated
const ACCEPT_REPLY: &str = "application/json, text/html;q=0.9";

/// Roster extensions the backend can read
pub const ROSTER_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// Backend reply, classified at the transport boundary
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    /// Structured JSON body
    Json(Value),
    /// Full HTML document
    Html(String),
}

impl RawReply {
    /// Classify a body using its content type, falling back to sniffing.
    pub fn classify(content_type: Option<&str>, body: String) -> Self {
        let declared_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        let looks_json = matches!(body.trim_start().chars().next(), Some('{') | Some('['));

        if declared_json || looks_json {
            match serde_json::from_str::<Value>(&body) {
                Ok(value) => return RawReply::Json(value),
                Err(e) => debug!(error = %e, "Body is not valid JSON, treating as HTML"),
            }
        }
        RawReply::Html(body)
    }
}

/// A spreadsheet roster selected for upload
#[derive(Debug, Clone)]
pub struct RosterFile {
    /// File name sent in the multipart part
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl RosterFile {
    /// Build a roster, validating the extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let extension = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !ROSTER_EXTENSIONS.contains(&extension.as_str()) {
            return Err(PubSummaryError::Validation(format!(
                "Unsupported file type '{}'. Use .csv, .xlsx or .xls",
                extension
            )));
        }

        Ok(Self { file_name, bytes })
    }

    /// Read a roster from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        // Check the extension before touching the file.
        Self::new(file_name.clone(), Vec::new())?;
        let bytes = tokio::fs::read(path).await?;
        Self::new(file_name, bytes)
    }

    fn mime_type(&self) -> &'static str {
        match self.file_name.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "csv" => "text/csv",
            Some(ext) if ext == "xls" => "application/vnd.ms-excel",
            _ => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// Export formats offered by the backend's download endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadFormat {
    #[default]
    Excel,
    Csv,
    Json,
}

impl DownloadFormat {
    /// Value of the `format` query parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            DownloadFormat::Excel => "excel",
            DownloadFormat::Csv => "csv",
            DownloadFormat::Json => "json",
        }
    }

    /// File name used when the backend does not suggest one
    pub fn default_file_name(&self) -> &'static str {
        match self {
            DownloadFormat::Excel => "faculty_publications.xlsx",
            DownloadFormat::Csv => "faculty_publications.csv",
            DownloadFormat::Json => "faculty_publications.json",
        }
    }
}

impl std::str::FromStr for DownloadFormat {
    type Err = PubSummaryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(DownloadFormat::Excel),
            "csv" => Ok(DownloadFormat::Csv),
            "json" => Ok(DownloadFormat::Json),
            other => Err(PubSummaryError::Validation(format!(
                "Unknown download format '{}'",
                other
            ))),
        }
    }
}

/// A downloaded export
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Operations the controller needs from the backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Search for a single author
    async fn search_author(&self, name: &str, institution: Option<&str>) -> Result<RawReply>;

    /// Upload a roster of authors
    async fn upload_roster(&self, file: &RosterFile) -> Result<RawReply>;

    /// Fetch the export of the most recent results
    async fn download(&self, format: DownloadFormat) -> Result<Export>;
}

/// reqwest-based backend client
pub struct BackendClient {
    client: reqwest::Client,
    config: Config,
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// No timeout is set; the backend is trusted to answer within an
    /// interactive interval.
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pubsummary/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_config("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send a request and turn non-2xx statuses into `Backend` errors.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.header(ACCEPT, ACCEPT_REPLY).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PubSummaryError::Backend {
                status: status.as_u16(),
                message: backend_error_message(&body),
            });
        }

        Ok(response)
    }

    async fn read_reply(response: reqwest::Response) -> Result<RawReply> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        let reply = RawReply::classify(content_type.as_deref(), body);
        debug!(
            json = matches!(reply, RawReply::Json(_)),
            content_type = ?content_type,
            "Classified backend reply"
        );
        Ok(reply)
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn search_author(&self, name: &str, institution: Option<&str>) -> Result<RawReply> {
        let mut form = vec![("name", name)];
        if let Some(institution) = institution.filter(|i| !i.trim().is_empty()) {
            form.push(("institution", institution));
        }

        info!(name = name, institution = ?institution, "Searching for author");
        let response = self
            .send(self.client.post(self.config.search_url()).form(&form))
            .await?;
        Self::read_reply(response).await
    }

    async fn upload_roster(&self, file: &RosterFile) -> Result<RawReply> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.mime_type())?;
        let form = Form::new().part("file", part);

        info!(file = %file.file_name, bytes = file.bytes.len(), "Uploading roster");
        let response = self
            .send(self.client.post(self.config.search_url()).multipart(form))
            .await?;
        Self::read_reply(response).await
    }

    async fn download(&self, format: DownloadFormat) -> Result<Export> {
        let url = self.config.download_url(format.as_param())?;
        info!(url = %url, "Downloading export");

        let response = self.send(self.client.get(url)).await?;
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name)
            .unwrap_or_else(|| format.default_file_name().to_string());
        let bytes = response.bytes().await?.to_vec();

        Ok(Export { file_name, bytes })
    }
}

/// Pick the backend's own message out of an error body. Empty when the body
/// carries none (an HTML error page or no body at all).
fn backend_error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('<') {
        return text.to_string();
    }

    String::new()
}

/// Extract `filename=` from a Content-Disposition value, dropping any path.
fn attachment_file_name(header: &str) -> Option<String> {
    let raw = header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');
    let name = Path::new(raw).file_name()?.to_str()?.to_string();
    (!name.is_empty()).then_some(name)
}
