//! The seam between the search service and the three platform clients.

use crate::challenge;
use crate::error::{AcademicError, Result};
use crate::models::{AuthorSummary, Platform, Profile, Publication, ResearcherInfo};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Browser user agent for the HTML platforms
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Timeout applied to every upstream request
pub(crate) const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// What a platform returned for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceResults {
    pub publications: Vec<Publication>,
    pub profiles: Vec<Profile>,
    /// Summary of the researcher when the request resolved to one person
    pub researcher_info: Option<ResearcherInfo>,
}

impl SourceResults {
    /// Results for a single resolved profile: the profile's publications are
    /// lifted to the top level and the profile itself is kept alongside.
    pub fn from_profile(mut profile: Profile) -> Self {
        let publications = std::mem::take(&mut profile.publications);
        Self {
            researcher_info: Some(ResearcherInfo::from(&profile)),
            publications,
            profiles: vec![profile],
        }
    }

    pub fn total(&self) -> usize {
        self.publications.len() + self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A searchable upstream platform.
#[async_trait]
pub trait ResearchSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Researchers matching a person's name.
    async fn search_author(&self, name: &str, max_results: usize) -> Result<SourceResults>;

    /// Works or researchers matching a subject.
    async fn search_topic(&self, topic: &str, max_results: usize) -> Result<SourceResults>;

    /// One researcher, identified by a profile URL or platform identifier.
    async fn profile(&self, reference: &str, max_publications: usize) -> Result<SourceResults>;

    /// Candidate author cards for a name. Only Scholar has an author directory.
    async fn search_authors(&self, name: &str, max_results: usize) -> Result<Vec<AuthorSummary>> {
        let _ = (name, max_results);
        Err(AcademicError::Validation(format!(
            "{} has no author directory",
            self.platform()
        )))
    }
}

/// HTTP client shared by the platform clients.
pub(crate) fn build_http_client(user_agent: &str, proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        .timeout(UPSTREAM_TIMEOUT)
        .cookie_store(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            AcademicError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| AcademicError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Send `request` and return its body, mapping rate limits, error statuses
/// and challenge pages to errors.
pub(crate) async fn fetch_text(request: RequestBuilder, platform: Platform) -> Result<String> {
    let response = request.send().await?;

    let status = response.status();
    debug!(platform = %platform, status = status.as_u16(), url = %response.url(), "Upstream response");
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        return Err(AcademicError::RateLimited(retry_after));
    }
    challenge::check_redirect(platform, response.url())?;

    let body = response.text().await?;
    challenge::check(platform, &body)?;

    if !status.is_success() {
        return Err(AcademicError::Api {
            code: i32::from(status.as_u16()),
            message: format!("{} returned HTTP {}", platform, status),
        });
    }
    Ok(body)
}
