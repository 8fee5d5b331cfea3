//! Terminal dashboard client.
//!
//! [`DashboardClient`] talks to a running backend and never fails a search:
//! transport and decode errors come back as a synthetic
//! `{"success": false, "message": ...}` response, which the normalizer and
//! statistics handle like any other payload. Exports re-query the backend
//! with `export=true` so the spreadsheet reflects server-side data.

use crate::challenge::legacy_sentinel;
use crate::error::{AcademicError, Result};
use crate::models::Platform;
use crate::normalize::{count_by_platform, dedup_by_identity, filter_tab, flatten, Item, ItemKind, PlatformCounts, Tab};
use crate::response::SearchType;
use crate::stats::{self, ExportStatistics};
use reqwest::Client;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default backend URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Timeout of every backend call
pub const DASHBOARD_TIMEOUT: Duration = Duration::from_secs(60);

/// Synthetic failure response.
pub fn failure_response(message: impl Into<String>) -> Value {
    json!({ "success": false, "message": message.into() })
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub search_type: SearchType,
    /// `None` searches every platform
    pub platform: Option<Platform>,
    pub max_results: usize,
    pub filter_keywords: bool,
    pub persist: bool,
}

/// A downloaded consolidated spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct DashboardClient {
    client: Client,
    base_url: Url,
    exporting: ExportFlag,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| AcademicError::Config(format!("Invalid backend URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(DASHBOARD_TIMEOUT)
            .build()
            .map_err(|e| AcademicError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            exporting: ExportFlag::default(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AcademicError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Backend URL serving `request`.
    pub fn endpoint(&self, request: &SearchRequest, export: bool) -> Result<Url> {
        let max = request.max_results.to_string();
        let flags = |url: &mut Url| {
            url.query_pairs_mut()
                .append_pair("max_results", &max)
                .append_pair("export", bool_str(export))
                .append_pair("persist", bool_str(request.persist))
                .append_pair("filter_keywords", bool_str(request.filter_keywords));
        };

        let url = match (request.platform, request.search_type) {
            (Some(platform), SearchType::Author) => {
                let mut url = self.url(&format!("/search/author/{}", platform))?;
                url.query_pairs_mut().append_pair("author", &request.query);
                flags(&mut url);
                url
            }
            (Some(platform), SearchType::Topic) => {
                let mut url = self.url(&format!("/search/topic/{}", platform))?;
                url.query_pairs_mut().append_pair("topic", &request.query);
                flags(&mut url);
                url
            }
            (platform, SearchType::Profile) => {
                let mut url = self.url("/search/author/profile")?;
                url.query_pairs_mut()
                    .append_pair("profile_url", &request.query)
                    .append_pair("max_publications", &max)
                    .append_pair("export", bool_str(export))
                    .append_pair("persist", bool_str(request.persist))
                    .append_pair("filter_keywords", bool_str(request.filter_keywords));
                if let Some(platform) = platform {
                    url.query_pairs_mut().append_pair("platform", platform.as_str());
                }
                url
            }
            (_, SearchType::Publications) => {
                let mut url = self.url(&format!(
                    "/search/author/publications/{}",
                    urlencoding::encode(&request.query)
                ))?;
                flags(&mut url);
                url
            }
            (platform, search_type) => {
                let mut url = self.url("/search/comprehensive")?;
                url.query_pairs_mut()
                    .append_pair("query", &request.query)
                    .append_pair("search_type", search_type.as_str())
                    .append_pair("platforms", platform.map(|p| p.as_str()).unwrap_or("all"))
                    .append_pair("max_results", &max)
                    .append_pair("export", bool_str(export));
                url
            }
        };
        Ok(url)
    }

    /// Run `request`; failures come back as a failure response.
    pub async fn search(&self, request: &SearchRequest) -> Value {
        match self.endpoint(request, false) {
            Ok(url) => self.get_json(url).await,
            Err(e) => failure_response(e.to_string()),
        }
    }

    /// Re-run `request` with `export=true` and return the spreadsheet name.
    ///
    /// Only one export runs at a time; a second concurrent call is rejected.
    pub async fn export(&self, request: &SearchRequest) -> Result<String> {
        let _permit = self
            .exporting
            .try_begin()
            .ok_or_else(|| AcademicError::Validation("An export is already running".to_string()))?;

        info!(query = %request.query, "Requesting spreadsheet export");
        let response = self.get_json(self.endpoint(request, true)?).await;
        excel_file(&response)
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.is_active()
    }

    /// Download the consolidated spreadsheet of every stored search.
    pub async fn consolidated(&self) -> Result<ConsolidatedExport> {
        let response = self.client.get(self.url("/export/consolidated")?).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_else(|_| failure_response(status.to_string()));
            return Err(AcademicError::Export(message_of(&body)));
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| "consolidated_research.csv".to_string());
        let bytes = response.bytes().await?.to_vec();
        info!(filename = %filename, bytes = bytes.len(), "Downloaded consolidated export");
        Ok(ConsolidatedExport { filename, bytes })
    }

    async fn get_json(&self, url: Url) -> Value {
        debug!(url = %url, "Backend request");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Backend unreachable");
                return failure_response(format!("Backend unreachable: {}", e));
            }
        };
        let status = response.status();
        match response.json::<Value>().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "Undecodable backend response");
                failure_response(format!("Invalid backend response ({}): {}", status, e))
            }
        }
    }
}

fn bool_str(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

fn message_of(response: &Value) -> String {
    response
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string()
}

/// Spreadsheet name of an export response; a missing name is a failure.
pub fn excel_file(response: &Value) -> Result<String> {
    if response.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(AcademicError::Export(message_of(response)));
    }
    match response.get("excel_file").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        _ => {
            let reason = response
                .get("export_error")
                .and_then(Value::as_str)
                .unwrap_or("response carried no spreadsheet file name");
            Err(AcademicError::Export(reason.to_string()))
        }
    }
}

fn filename_from_disposition(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Ticket taken by a search before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Holds the latest search results.
///
/// A response is published only when no newer ticket has already been
/// published, so a slow response never overwrites a faster, newer one.
#[derive(Debug)]
pub struct ResultsSlot<T> {
    issued: AtomicU64,
    current: Mutex<(u64, Option<T>)>,
}

impl<T> Default for ResultsSlot<T> {
    fn default() -> Self {
        Self {
            issued: AtomicU64::new(0),
            current: Mutex::new((0, None)),
        }
    }
}

impl<T: Clone> ResultsSlot<T> {
    pub fn ticket(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Store `value` unless a newer ticket already published. Returns
    /// whether the value was stored.
    pub fn publish(&self, ticket: Ticket, value: T) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if ticket.0 <= current.0 {
            debug!(ticket = ticket.0, published = current.0, "Discarding stale results");
            return false;
        }
        *current = (ticket.0, Some(value));
        true
    }

    pub fn current(&self) -> Option<T> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .1
            .clone()
    }
}

/// The "is exporting" flag.
#[derive(Debug, Default)]
pub struct ExportFlag(AtomicBool);

impl ExportFlag {
    /// Claim the flag, or `None` when an export is already running.
    pub fn try_begin(&self) -> Option<ExportPermit<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportPermit(&self.0))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the export flag when dropped.
#[derive(Debug)]
pub struct ExportPermit<'a>(&'a AtomicBool);

impl Drop for ExportPermit<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Everything the dashboard shows for one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub success: bool,
    pub message: String,
    pub items: Vec<Item>,
    pub counts: PlatformCounts,
    pub stats: ExportStatistics,
    /// Set when the backend hit an anti-automation challenge
    pub challenge: Option<String>,
}

impl ResultsView {
    pub fn from_response(response: &Value, dedup: bool) -> Self {
        let mut items = flatten(response);
        if dedup {
            items = dedup_by_identity(items);
        }

        let challenge = match response.get("challenge").filter(|c| !c.is_null()) {
            Some(notice) => Some(
                notice
                    .get("instructions")
                    .and_then(Value::as_str)
                    .unwrap_or("Anti-automation challenge")
                    .to_string(),
            ),
            None if legacy_sentinel(response) => {
                Some("A platform returned a CAPTCHA page; solve it in a browser and retry.".to_string())
            }
            None => None,
        };

        Self {
            success: response.get("success").and_then(Value::as_bool).unwrap_or(true),
            message: response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            counts: count_by_platform(&items),
            stats: stats::compute(response),
            items,
            challenge,
        }
    }

    pub fn visible(&self, tab: Tab) -> Vec<&Item> {
        filter_tab(&self.items, tab)
            .into_iter()
            .filter(|item| item.is_renderable())
            .collect()
    }

    pub fn can_export(&self) -> bool {
        self.stats.can_export()
    }
}

fn platform_label(platform: Platform) -> &'static str {
    match platform {
        Platform::Scholar => "Scholar",
        Platform::Lattes => "Lattes",
        Platform::Orcid => "ORCID",
    }
}

fn render_item(out: &mut String, item: &Item) {
    let tag = item.platform.as_str();
    match &item.kind {
        ItemKind::Publication(p) => {
            let _ = write!(out, "[{}] {}", tag, p.title);
            if let Some(year) = p.year {
                let _ = write!(out, " ({})", year);
            }
            out.push('\n');
            if let Some(authors) = &p.authors {
                let _ = writeln!(out, "      {}", authors);
            }
            let mut details = Vec::new();
            if let Some(venue) = &p.venue {
                details.push(venue.clone());
            }
            if let Some(citations) = p.citations {
                details.push(format!("cited by {}", citations));
            }
            if !p.keywords_found.is_empty() {
                details.push(format!("keywords: {}", p.keywords_found.join(", ")));
            }
            if !details.is_empty() {
                let _ = writeln!(out, "      {}", details.join(" | "));
            }
        }
        ItemKind::Profile(p) => {
            let _ = writeln!(out, "[{}] {}", tag, p.name);
            if let Some(institution) = &p.institution {
                let _ = writeln!(out, "      {}", institution);
            }
            let metrics: Vec<String> = [
                p.h_index.map(|v| format!("h-index {}", v)),
                p.i10_index.map(|v| format!("i10 {}", v)),
                p.total_citations.map(|v| format!("{} citations", v)),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !metrics.is_empty() {
                let _ = writeln!(out, "      {}", metrics.join(" | "));
            }
        }
        ItemKind::Unclassified(_) => return,
    }
    if let Some(link) = item.link() {
        let _ = writeln!(out, "      {}", link);
    }
}

/// Plain-text rendering of `view` with `tab` active.
pub fn render(view: &ResultsView, tab: Tab) -> String {
    let mut out = String::new();
    if !view.success {
        let _ = writeln!(out, "Search failed: {}", view.message);
    } else if !view.message.is_empty() {
        let _ = writeln!(out, "{}", view.message);
    }
    if let Some(challenge) = &view.challenge {
        let _ = writeln!(out, "Challenge: {}", challenge);
    }

    let mut tabs = vec![format!("All ({})", view.counts.total())];
    tabs.extend(
        Platform::ALL
            .iter()
            .map(|&p| format!("{} ({})", platform_label(p), view.counts.get(p))),
    );
    let _ = writeln!(out, "{}", tabs.join(" | "));
    out.push('\n');

    let visible = view.visible(tab);
    if visible.is_empty() {
        out.push_str("No results.\n");
    }
    for item in visible {
        render_item(&mut out, item);
    }

    let s = &view.stats;
    let _ = writeln!(
        out,
        "\nAuthors: {}  Publications: {}  Citations: {}  Max h-index: {}  Max i10: {}",
        s.total_authors, s.total_publications, s.total_citations, s.max_h_index, s.max_i10_index
    );
    out
}
