//! Response envelopes returned by the backend.
//!
//! Every record list is serialized with an explicit `kind` tag on each item.

use crate::challenge::ChallengeNotice;
use crate::error::AcademicError;
use crate::models::{tagged, AuthorSummary, Platform, Profile, Publication, ResearcherInfo};
use crate::source::SourceResults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What kind of search produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Author,
    Topic,
    /// Author and topic search together (comprehensive only)
    Both,
    Profile,
    Publications,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Author => "author",
            SearchType::Topic => "topic",
            SearchType::Both => "both",
            SearchType::Profile => "profile",
            SearchType::Publications => "publications",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = AcademicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "author" => Ok(SearchType::Author),
            "topic" => Ok(SearchType::Topic),
            "both" => Ok(SearchType::Both),
            "profile" => Ok(SearchType::Profile),
            "publications" => Ok(SearchType::Publications),
            other => Err(AcademicError::Validation(format!("Unknown search type '{}'", other))),
        }
    }
}

/// Records of a single-platform response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchData {
    #[serde(serialize_with = "tagged::records", skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<Publication>,
    #[serde(serialize_with = "tagged::records", skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
}

impl SearchData {
    pub fn len(&self) -> usize {
        self.publications.len() + self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publications at the top level plus those nested in profiles.
    pub fn publication_count(&self) -> usize {
        self.publications.len() + self.profiles.iter().map(|p| p.publications.len()).sum::<usize>()
    }
}

/// One platform's share of a comprehensive search.
///
/// Profiles travel under the platform's own key (`profiles`,
/// `lattes_profiles` or `orcid_profiles`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformResult {
    pub success: bool,
    pub total_results: usize,
    #[serde(serialize_with = "tagged::records", skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<Publication>,
    #[serde(serialize_with = "tagged::records", skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
    #[serde(serialize_with = "tagged::records", skip_serializing_if = "Vec::is_empty")]
    pub lattes_profiles: Vec<Profile>,
    #[serde(serialize_with = "tagged::records", skip_serializing_if = "Vec::is_empty")]
    pub orcid_profiles: Vec<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub researcher_info: Option<ResearcherInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<ChallengeNotice>,
}

impl PlatformResult {
    pub fn from_results(platform: Platform, results: SourceResults) -> Self {
        let mut out = Self {
            success: true,
            total_results: results.total(),
            publications: results.publications,
            researcher_info: results.researcher_info,
            ..Default::default()
        };
        match platform {
            Platform::Scholar => out.profiles = results.profiles,
            Platform::Lattes => out.lattes_profiles = results.profiles,
            Platform::Orcid => out.orcid_profiles = results.profiles,
        }
        out
    }

    pub fn failed(err: &AcademicError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            challenge: ChallengeNotice::from_error(err),
            ..Default::default()
        }
    }

    /// All profiles regardless of the key they travel under.
    pub fn all_profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles
            .iter()
            .chain(&self.lattes_profiles)
            .chain(&self.orcid_profiles)
    }
}

/// Per-platform bookkeeping of a comprehensive search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformStats {
    pub requested: usize,
    pub returned: usize,
    /// Seconds spent on this platform
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Envelope of every search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub message: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    pub search_type: SearchType,
    pub total_results: usize,
    /// Seconds
    pub execution_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub researcher_info: Option<ResearcherInfo>,
    #[serde(skip_serializing_if = "SearchData::is_empty")]
    pub data: SearchData,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub results_by_platform: BTreeMap<Platform, PlatformResult>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub platform_stats: BTreeMap<Platform, PlatformStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<Platform>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results_per_platform: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_platforms: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_total: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub filtered_by_keywords: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excel_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<ChallengeNotice>,
}

impl SearchResponse {
    /// Empty successful response.
    pub fn new(query: &str, platform: Option<Platform>, search_type: SearchType) -> Self {
        Self {
            success: true,
            message: String::new(),
            query: query.to_string(),
            platform,
            search_type,
            total_results: 0,
            execution_time: 0.0,
            researcher_info: None,
            data: SearchData::default(),
            results_by_platform: BTreeMap::new(),
            platform_stats: BTreeMap::new(),
            platforms: None,
            max_results_per_platform: None,
            successful_platforms: None,
            expected_total: None,
            filtered_by_keywords: false,
            original_total: None,
            excel_file: None,
            export_error: None,
            database_id: None,
            database_error: None,
            challenge: None,
        }
    }

    /// Failure response carrying a readable message.
    pub fn failure(query: &str, platform: Option<Platform>, search_type: SearchType, err: &AcademicError) -> Self {
        let challenge = ChallengeNotice::from_error(err);
        let message = match &challenge {
            Some(notice) => format!("{}. {}", err, notice.instructions),
            None => err.to_string(),
        };
        Self {
            success: false,
            message,
            challenge,
            ..Self::new(query, platform, search_type)
        }
    }

    /// Single-platform response from one source's results.
    pub fn from_results(query: &str, platform: Platform, search_type: SearchType, results: SourceResults) -> Self {
        let mut response = Self::new(query, Some(platform), search_type);
        response.researcher_info = results.researcher_info;
        response.data = SearchData {
            publications: results.publications,
            profiles: results.profiles,
        };
        response.total_results = response.data.len();
        response.message = format!("Found {} results on {}", response.total_results, platform);
        response
    }

    /// Every publication in the response, single-platform data first.
    pub fn publications(&self) -> impl Iterator<Item = (Platform, &Publication)> {
        let own = self.platform.unwrap_or(Platform::Scholar);
        self.data
            .publications
            .iter()
            .map(move |p| (own, p))
            .chain(
                self.results_by_platform
                    .iter()
                    .flat_map(|(platform, result)| result.publications.iter().map(move |p| (*platform, p))),
            )
    }

    /// Every profile in the response.
    pub fn profiles(&self) -> impl Iterator<Item = (Platform, &Profile)> {
        let own = self.platform.unwrap_or(Platform::Lattes);
        self.data
            .profiles
            .iter()
            .map(move |p| (own, p))
            .chain(
                self.results_by_platform
                    .iter()
                    .flat_map(|(platform, result)| result.all_profiles().map(move |p| (*platform, p))),
            )
    }
}

/// Envelope of the Scholar author search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorsResponse {
    pub success: bool,
    pub message: String,
    pub query: String,
    pub total_results: usize,
    pub execution_time: f64,
    pub authors: Vec<AuthorSummary>,
}
