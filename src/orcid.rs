//! ORCID public API client.
//!
//! Name and keyword searches go through `expanded-search`; a single
//! researcher is read from the full `/record` document.
//! See <https://info.orcid.org/documentation/api-tutorials/>.

use crate::error::{AcademicError, Result};
use crate::models::{orcid_url, Platform, Profile, Publication};
use crate::source::{fetch_text, ResearchSource, SourceResults, UPSTREAM_TIMEOUT};
use async_trait::async_trait;
use chrono::DateTime;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::info;

/// Public API base URL
pub const DEFAULT_ORCID_API: &str = "https://pub.orcid.org/v3.0";

/// Largest page the expanded search serves
const MAX_ROWS: usize = 200;

#[derive(Debug, Deserialize)]
struct ExpandedSearch {
    #[serde(rename = "expanded-result", default)]
    results: Option<Vec<ExpandedResult>>,
}

#[derive(Debug, Deserialize)]
struct ExpandedResult {
    #[serde(rename = "orcid-id")]
    orcid_id: Option<String>,
    #[serde(rename = "given-names")]
    given_names: Option<String>,
    #[serde(rename = "family-names")]
    family_names: Option<String>,
    #[serde(rename = "credit-name")]
    credit_name: Option<String>,
    #[serde(rename = "institution-name", default)]
    institution_name: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    person: Option<Person>,
    #[serde(rename = "activities-summary")]
    activities: Option<Activities>,
}

#[derive(Debug, Deserialize)]
struct Person {
    name: Option<PersonName>,
    biography: Option<Biography>,
    keywords: Option<Keywords>,
}

#[derive(Debug, Deserialize)]
struct PersonName {
    #[serde(rename = "given-names")]
    given_names: Option<StringValue>,
    #[serde(rename = "family-name")]
    family_name: Option<StringValue>,
    #[serde(rename = "credit-name")]
    credit_name: Option<StringValue>,
}

#[derive(Debug, Deserialize)]
struct StringValue {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Biography {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Keywords {
    #[serde(default)]
    keyword: Vec<Keyword>,
}

#[derive(Debug, Deserialize)]
struct Keyword {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Activities {
    #[serde(rename = "last-modified-date")]
    last_modified: Option<Timestamp>,
    employments: Option<AffiliationGroups>,
    works: Option<Works>,
}

#[derive(Debug, Deserialize)]
struct Timestamp {
    value: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AffiliationGroups {
    #[serde(rename = "affiliation-group", default)]
    groups: Vec<AffiliationGroup>,
}

#[derive(Debug, Deserialize)]
struct AffiliationGroup {
    #[serde(default)]
    summaries: Vec<AffiliationSummary>,
}

#[derive(Debug, Deserialize)]
struct AffiliationSummary {
    #[serde(rename = "employment-summary")]
    employment: Option<Employment>,
}

#[derive(Debug, Deserialize)]
struct Employment {
    organization: Option<Organization>,
    #[serde(rename = "role-title")]
    role_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Works {
    #[serde(default)]
    group: Vec<WorkGroup>,
}

#[derive(Debug, Deserialize)]
struct WorkGroup {
    #[serde(rename = "work-summary", default)]
    summaries: Vec<WorkSummary>,
}

#[derive(Debug, Deserialize)]
struct WorkSummary {
    title: Option<WorkTitle>,
    #[serde(rename = "publication-date")]
    publication_date: Option<PublicationDate>,
    #[serde(rename = "journal-title")]
    journal_title: Option<StringValue>,
    #[serde(rename = "external-ids")]
    external_ids: Option<ExternalIds>,
    url: Option<StringValue>,
}

#[derive(Debug, Deserialize)]
struct WorkTitle {
    title: Option<StringValue>,
}

#[derive(Debug, Deserialize)]
struct PublicationDate {
    year: Option<StringValue>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "external-id", default)]
    ids: Vec<ExternalId>,
}

#[derive(Debug, Deserialize)]
struct ExternalId {
    #[serde(rename = "external-id-type")]
    id_type: Option<String>,
    #[serde(rename = "external-id-value")]
    value: Option<String>,
}

fn value_of(v: Option<StringValue>) -> Option<String> {
    v.and_then(|s| s.value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub struct OrcidClient {
    client: Client,
    api_base: String,
}

impl OrcidClient {
    pub fn new(api_base: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .user_agent(concat!("rustacademic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AcademicError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ORCID_API.to_string()),
        })
    }

    /// Run an expanded search with a Solr query.
    async fn expanded_search(&self, query: &str, max_results: usize) -> Result<Vec<Profile>> {
        let rows = max_results.clamp(1, MAX_ROWS);
        let url = format!(
            "{}/expanded-search/?q={}&rows={}&start=0",
            self.api_base,
            urlencoding::encode(query),
            rows
        );
        info!(query, rows, "Starting ORCID search");

        let body = self.get_json(&url).await?;
        let profiles = parse_expanded_search(&body)?;
        info!(count = profiles.len(), "ORCID search complete");
        Ok(profiles)
    }

    /// Full record of `orcid_id`.
    pub async fn record(&self, orcid_id: &str, max_publications: usize) -> Result<Profile> {
        let url = format!("{}/{}/record", self.api_base, orcid_id);
        info!(orcid_id, "Loading ORCID record");
        let body = self.get_json(&url).await?;
        let mut profile = parse_record(&body, orcid_id)?;
        profile.publications.truncate(max_publications);
        Ok(profile)
    }

    async fn get_json(&self, url: &str) -> Result<String> {
        let request = self.client.get(url).header("Accept", "application/json");
        fetch_text(request, Platform::Orcid).await
    }
}

#[async_trait]
impl ResearchSource for OrcidClient {
    fn platform(&self) -> Platform {
        Platform::Orcid
    }

    async fn search_author(&self, name: &str, max_results: usize) -> Result<SourceResults> {
        let name = name.replace('"', "");
        let query = format!(
            "given-and-family-names:\"{name}\" OR credit-name:\"{name}\" OR other-names:\"{name}\""
        );
        Ok(SourceResults {
            profiles: self.expanded_search(&query, max_results).await?,
            ..Default::default()
        })
    }

    async fn search_topic(&self, topic: &str, max_results: usize) -> Result<SourceResults> {
        let query = format!("keyword:\"{}\"", topic.replace('"', ""));
        Ok(SourceResults {
            profiles: self.expanded_search(&query, max_results).await?,
            ..Default::default()
        })
    }

    async fn profile(&self, reference: &str, max_publications: usize) -> Result<SourceResults> {
        let orcid_id = match orcid_id_from_reference(reference) {
            Some(id) => id,
            None => self
                .search_author(reference, 1)
                .await?
                .profiles
                .into_iter()
                .find_map(|p| p.orcid_id)
                .ok_or_else(|| AcademicError::NotFound(format!("No ORCID record for '{}'", reference)))?,
        };
        let profile = self.record(&orcid_id, max_publications).await?;
        Ok(SourceResults::from_profile(profile))
    }
}

static ORCID_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d{4}-\d{4}-\d{4}-\d{3}[\dX]").ok());

/// ORCID iD found anywhere in `reference`.
pub fn orcid_id_from_reference(reference: &str) -> Option<String> {
    ORCID_ID
        .as_ref()?
        .find(reference)
        .map(|m| m.as_str().to_string())
}

/// Parse an `expanded-search` response into profiles.
pub fn parse_expanded_search(body: &str) -> Result<Vec<Profile>> {
    let search: ExpandedSearch = serde_json::from_str(body)?;
    Ok(search
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|result| {
            let orcid_id = result.orcid_id?;
            let name = result.credit_name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| {
                [result.given_names, result.family_names]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ")
            });
            Some(Profile {
                name: if name.trim().is_empty() { orcid_id.clone() } else { name.trim().to_string() },
                institution: result.institution_name.into_iter().next(),
                url: Some(orcid_url(&orcid_id)),
                orcid_id: Some(orcid_id),
                platform: Some(Platform::Orcid),
                ..Default::default()
            })
        })
        .collect())
}

/// Parse a full `/record` document.
pub fn parse_record(body: &str, orcid_id: &str) -> Result<Profile> {
    let record: Record = serde_json::from_str(body)?;

    let mut profile = Profile {
        orcid_id: Some(orcid_id.to_string()),
        url: Some(orcid_url(orcid_id)),
        platform: Some(Platform::Orcid),
        ..Default::default()
    };

    if let Some(person) = record.person {
        if let Some(name) = person.name {
            let credit = value_of(name.credit_name);
            let full = [value_of(name.given_names), value_of(name.family_name)]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            profile.name = credit.unwrap_or(full);
        }
        profile.summary = person
            .biography
            .and_then(|b| b.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        profile.research_areas = person
            .keywords
            .map(|k| k.keyword.into_iter().filter_map(|k| k.content).collect())
            .unwrap_or_default();
    }
    if profile.name.is_empty() {
        profile.name = orcid_id.to_string();
    }

    if let Some(activities) = record.activities {
        profile.last_update = activities
            .last_modified
            .and_then(|t| t.value)
            .and_then(DateTime::from_timestamp_millis)
            .map(|t| t.format("%d/%m/%Y").to_string());

        // most recent employment comes first
        let employment = activities
            .employments
            .into_iter()
            .flat_map(|e| e.groups)
            .flat_map(|g| g.summaries)
            .find_map(|s| s.employment);
        if let Some(employment) = employment {
            profile.institution = employment.organization.and_then(|o| o.name);
            profile.position = employment.role_title;
        }

        profile.publications = activities
            .works
            .into_iter()
            .flat_map(|w| w.group)
            .filter_map(|g| g.summaries.into_iter().next())
            .filter_map(work_to_publication)
            .collect();
        profile.total_publications = Some(profile.publications.len() as u64);
    }

    Ok(profile)
}

fn work_to_publication(work: WorkSummary) -> Option<Publication> {
    let title = value_of(work.title.and_then(|t| t.title))?;
    let doi = work.external_ids.and_then(|ids| {
        ids.ids
            .into_iter()
            .find(|id| id.id_type.as_deref() == Some("doi"))
            .and_then(|id| id.value)
    });
    Some(Publication {
        title,
        year: value_of(work.publication_date.and_then(|d| d.year)).and_then(|y| y.parse().ok()),
        venue: value_of(work.journal_title),
        url: value_of(work.url).or_else(|| doi.as_ref().map(|d| format!("https://doi.org/{}", d))),
        doi,
        platform: Some(Platform::Orcid),
        ..Default::default()
    })
}
