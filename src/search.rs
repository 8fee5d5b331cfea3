//! Search orchestration.
//!
//! [`SearchService`] routes a query to one or more [`ResearchSource`]s and
//! post-processes single-platform results: keyword filtering, persistence
//! and spreadsheet export, in that order. Every failure is folded into the
//! returned envelope; nothing here aborts the process.

use crate::challenge::ChallengeNotice;
use crate::error::{AcademicError, Result};
use crate::export::SpreadsheetExporter;
use crate::keywords::KeywordFilter;
use crate::lattes::curriculum_id_from_reference;
use crate::models::Platform;
use crate::orcid::orcid_id_from_reference;
use crate::response::{AuthorsResponse, PlatformResult, PlatformStats, SearchResponse, SearchType};
use crate::source::{ResearchSource, SourceResults};
use crate::store::{ResearchRecord, ResearchStore};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Default number of results per platform
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Hard cap on results per platform
pub const MAX_RESULTS_LIMIT: usize = 200;

/// Post-processing switches of a single-platform search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub export: bool,
    pub persist: bool,
    pub filter_keywords: bool,
}

/// Platform named by a profile URL or identifier.
///
/// Host names win; bare ORCID iDs and 16-digit curriculum ids are recognized
/// after that.
pub fn detect_platform(reference: &str) -> Option<Platform> {
    let lowered = reference.to_lowercase();
    if lowered.contains("lattes.cnpq.br") || lowered.contains("buscatextual.cnpq.br") {
        Some(Platform::Lattes)
    } else if lowered.contains("orcid.org") {
        Some(Platform::Orcid)
    } else if lowered.contains("scholar.google") {
        Some(Platform::Scholar)
    } else if orcid_id_from_reference(reference).is_some() {
        Some(Platform::Orcid)
    } else if reference.trim().len() == 16 && curriculum_id_from_reference(reference).is_some() {
        Some(Platform::Lattes)
    } else {
        None
    }
}

/// Parse `all` or a comma-separated platform list, keeping the canonical
/// scholar → lattes → orcid order.
pub fn parse_platforms(list: &str) -> Result<Vec<Platform>> {
    let list = list.trim();
    if list.is_empty() || list.eq_ignore_ascii_case("all") {
        return Ok(Platform::ALL.to_vec());
    }
    let mut platforms = list
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::parse::<Platform>)
        .collect::<Result<Vec<_>>>()?;
    platforms.sort();
    platforms.dedup();
    Ok(platforms)
}

fn clamp_max(max_results: usize) -> usize {
    max_results.clamp(1, MAX_RESULTS_LIMIT)
}

fn require_query(query: &str, what: &str) -> Result<()> {
    if query.trim().is_empty() {
        Err(AcademicError::Validation(format!("{} must not be empty", what)))
    } else {
        Ok(())
    }
}

/// Merge author and topic results of one platform.
fn merge_results(author: Result<SourceResults>, topic: Result<SourceResults>) -> Result<SourceResults> {
    match (author, topic) {
        (Ok(mut a), Ok(t)) => {
            a.publications.extend(t.publications);
            a.profiles.extend(t.profiles);
            a.researcher_info = a.researcher_info.or(t.researcher_info);
            Ok(a)
        }
        (Ok(results), Err(e)) | (Err(e), Ok(results)) => {
            warn!(error = %e, "One half of a combined search failed");
            Ok(results)
        }
        (Err(e), Err(_)) => Err(e),
    }
}

pub struct SearchService {
    sources: BTreeMap<Platform, Arc<dyn ResearchSource>>,
    store: Arc<dyn ResearchStore>,
    exporter: SpreadsheetExporter,
    keywords: KeywordFilter,
}

impl SearchService {
    pub fn new(store: Arc<dyn ResearchStore>, exporter: SpreadsheetExporter) -> Result<Self> {
        Ok(Self {
            sources: BTreeMap::new(),
            store,
            exporter,
            keywords: KeywordFilter::aging()?,
        })
    }

    /// Register `source` under its own platform, replacing any previous one.
    pub fn with_source(mut self, source: Arc<dyn ResearchSource>) -> Self {
        self.sources.insert(source.platform(), source);
        self
    }

    pub fn with_keywords(mut self, keywords: KeywordFilter) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn store(&self) -> &Arc<dyn ResearchStore> {
        &self.store
    }

    pub fn exporter(&self) -> &SpreadsheetExporter {
        &self.exporter
    }

    fn source(&self, platform: Platform) -> Result<&Arc<dyn ResearchSource>> {
        self.sources
            .get(&platform)
            .ok_or_else(|| AcademicError::Config(format!("{} is not configured", platform)))
    }

    pub async fn search_author(
        &self,
        platform: Platform,
        name: &str,
        max_results: usize,
        options: SearchOptions,
    ) -> SearchResponse {
        let started = Instant::now();
        let max_results = clamp_max(max_results);
        let results = match require_query(name, "Author name") {
            Ok(()) => match self.source(platform) {
                Ok(source) => source.search_author(name, max_results).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.single(name, platform, SearchType::Author, results, options, started)
            .await
    }

    pub async fn search_topic(
        &self,
        platform: Platform,
        topic: &str,
        max_results: usize,
        options: SearchOptions,
    ) -> SearchResponse {
        let started = Instant::now();
        let max_results = clamp_max(max_results);
        let results = match require_query(topic, "Topic") {
            Ok(()) => match self.source(platform) {
                Ok(source) => source.search_topic(topic, max_results).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.single(topic, platform, SearchType::Topic, results, options, started)
            .await
    }

    /// Load one researcher by profile URL, identifier or name.
    ///
    /// The platform comes from the reference itself when it names one,
    /// else from `platform`, else Scholar.
    pub async fn profile(
        &self,
        reference: &str,
        platform: Option<Platform>,
        max_publications: usize,
        options: SearchOptions,
    ) -> SearchResponse {
        let started = Instant::now();
        let platform = detect_platform(reference)
            .or(platform)
            .unwrap_or(Platform::Scholar);
        info!(reference, platform = %platform, "Profile request");

        let max_publications = clamp_max(max_publications);
        let results = match require_query(reference, "Profile reference") {
            Ok(()) => match self.source(platform) {
                Ok(source) => source.profile(reference.trim(), max_publications).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.single(reference, platform, SearchType::Profile, results, options, started)
            .await
    }

    /// Publications of a Scholar author id.
    pub async fn author_publications(
        &self,
        author_id: &str,
        author_name: Option<&str>,
        max_results: usize,
        options: SearchOptions,
    ) -> SearchResponse {
        let started = Instant::now();
        let label = author_name.filter(|n| !n.trim().is_empty()).unwrap_or(author_id);
        let results = match require_query(author_id, "Author id") {
            Ok(()) => match self.source(Platform::Scholar) {
                Ok(source) => source.profile(author_id.trim(), clamp_max(max_results)).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.single(label, Platform::Scholar, SearchType::Publications, results, options, started)
            .await
    }

    /// Author cards from Scholar's author directory.
    pub async fn scholar_authors(&self, name: &str, max_results: usize) -> AuthorsResponse {
        let started = Instant::now();
        let outcome = match require_query(name, "Author name") {
            Ok(()) => match self.source(Platform::Scholar) {
                Ok(source) => source.search_authors(name, clamp_max(max_results)).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        let execution_time = started.elapsed().as_secs_f64();
        match outcome {
            Ok(authors) => AuthorsResponse {
                success: true,
                message: format!("Found {} authors", authors.len()),
                query: name.to_string(),
                total_results: authors.len(),
                execution_time,
                authors,
            },
            Err(e) => {
                warn!(name, error = %e, "Scholar author search failed");
                AuthorsResponse {
                    success: false,
                    message: e.to_string(),
                    query: name.to_string(),
                    total_results: 0,
                    execution_time,
                    authors: Vec::new(),
                }
            }
        }
    }

    /// Fan `query` out to `platforms` concurrently and merge the results in
    /// platform order. One platform failing does not fail the others.
    pub async fn comprehensive(
        &self,
        query: &str,
        search_type: SearchType,
        platforms: &[Platform],
        max_results: usize,
        export: bool,
    ) -> SearchResponse {
        let started = Instant::now();
        let max_results = clamp_max(max_results);
        if let Err(e) = require_query(query, "Query") {
            return SearchResponse::failure(query, None, search_type, &e);
        }

        let mut platforms = platforms.to_vec();
        platforms.sort();
        platforms.dedup();
        info!(query, search_type = %search_type, platforms = ?platforms, max_results, "Comprehensive search");

        let searches = platforms.iter().map(|&platform| async move {
            let platform_started = Instant::now();
            let outcome = self.platform_search(platform, query, search_type, max_results).await;
            (platform, outcome, platform_started.elapsed().as_secs_f64())
        });
        let outcomes = join_all(searches).await;

        let mut response = SearchResponse::new(query, None, search_type);
        let mut first_error: Option<AcademicError> = None;
        for (platform, outcome, time) in outcomes {
            let (result, stats) = match outcome {
                Ok(results) => {
                    let returned = results.total();
                    let stats = PlatformStats {
                        requested: max_results,
                        returned,
                        time,
                        error: None,
                    };
                    (PlatformResult::from_results(platform, results), stats)
                }
                Err(e) => {
                    warn!(platform = %platform, error = %e, "Platform search failed");
                    let stats = PlatformStats {
                        requested: max_results,
                        returned: 0,
                        time,
                        error: Some(e.to_string()),
                    };
                    let result = PlatformResult::failed(&e);
                    // a challenge is the more useful report
                    let replace = match &first_error {
                        None => true,
                        Some(previous) => e.is_challenge() && !previous.is_challenge(),
                    };
                    if replace {
                        first_error = Some(e);
                    }
                    (result, stats)
                }
            };
            response.results_by_platform.insert(platform, result);
            response.platform_stats.insert(platform, stats);
        }

        let successful = response.results_by_platform.values().filter(|r| r.success).count();
        response.total_results = response.results_by_platform.values().map(|r| r.total_results).sum();
        response.successful_platforms = Some(successful);
        response.expected_total = Some(max_results * platforms.len());
        response.max_results_per_platform = Some(max_results);
        response.message = format!(
            "Found {} results on {} of {} platforms",
            response.total_results,
            successful,
            platforms.len()
        );
        response.platforms = Some(platforms);

        if successful == 0 {
            if let Some(e) = first_error {
                response.success = false;
                response.message = format!("All platforms failed: {}", e);
                response.challenge = ChallengeNotice::from_error(&e);
            }
        }

        if export {
            self.export(&mut response);
        }
        response.execution_time = started.elapsed().as_secs_f64();
        info!(
            query,
            total = response.total_results,
            successful,
            elapsed = response.execution_time,
            "Comprehensive search complete"
        );
        response
    }

    async fn platform_search(
        &self,
        platform: Platform,
        query: &str,
        search_type: SearchType,
        max_results: usize,
    ) -> Result<SourceResults> {
        let source = self.source(platform)?;
        match search_type {
            SearchType::Author => source.search_author(query, max_results).await,
            SearchType::Topic | SearchType::Publications => source.search_topic(query, max_results).await,
            SearchType::Profile => source.profile(query, max_results).await,
            SearchType::Both => {
                let (author, topic) = tokio::join!(
                    source.search_author(query, max_results),
                    source.search_topic(query, max_results)
                );
                merge_results(author, topic)
            }
        }
    }

    /// Build and post-process a single-platform response.
    async fn single(
        &self,
        query: &str,
        platform: Platform,
        search_type: SearchType,
        results: Result<SourceResults>,
        options: SearchOptions,
        started: Instant,
    ) -> SearchResponse {
        let mut response = match results {
            Ok(results) => SearchResponse::from_results(query, platform, search_type, results),
            Err(e) => {
                warn!(query, platform = %platform, search_type = %search_type, error = %e, "Search failed");
                let mut failed = SearchResponse::failure(query, Some(platform), search_type, &e);
                failed.execution_time = started.elapsed().as_secs_f64();
                return failed;
            }
        };

        if options.filter_keywords {
            self.filter_keywords(&mut response);
        }
        response.execution_time = started.elapsed().as_secs_f64();

        let persist_filtered = response.filtered_by_keywords && response.data.publication_count() > 0;
        if options.persist || persist_filtered {
            self.persist(&mut response, platform).await;
        }
        if options.export {
            self.export(&mut response);
        }

        info!(
            query,
            platform = %platform,
            search_type = %search_type,
            total = response.total_results,
            elapsed = response.execution_time,
            "Search complete"
        );
        response
    }

    /// Keep matching publications, both top-level and nested in profiles.
    fn filter_keywords(&self, response: &mut SearchResponse) {
        let original_total = response.data.publication_count();
        let publications = std::mem::take(&mut response.data.publications);
        response.data.publications = self.keywords.apply(publications);
        for profile in &mut response.data.profiles {
            let nested = std::mem::take(&mut profile.publications);
            profile.publications = self.keywords.apply(nested);
            if profile.total_publications.is_some() {
                profile.total_publications = Some(profile.publications.len() as u64);
            }
        }

        let kept = response.data.publication_count();
        response.filtered_by_keywords = true;
        response.original_total = Some(original_total);
        response.total_results = response.data.len();
        response.message = format!(
            "{} of {} publications matched the keyword filter",
            kept, original_total
        );
        info!(kept, original_total, "Applied keyword filter");
    }

    async fn persist(&self, response: &mut SearchResponse, platform: Platform) {
        let mut record = ResearchRecord::new(&response.query, platform, response.search_type);
        record.researcher_info = response.researcher_info.clone();
        record.total_publications = response.data.publication_count();
        record.filtered_by_keywords = response.filtered_by_keywords;
        record.original_total = response.original_total;
        record.publications = response.data.publications.clone();
        record.profiles = response
            .data
            .profiles
            .iter()
            .filter(|p| !p.publications.is_empty())
            .cloned()
            .collect();
        record.execution_time = response.execution_time;

        match self.store.save(record).await {
            Ok(id) => response.database_id = Some(id),
            Err(e) => {
                warn!(error = %e, "Failed to persist search");
                response.database_error = Some(e.to_string());
            }
        }
    }

    fn export(&self, response: &mut SearchResponse) {
        match self.exporter.export_search(response) {
            Ok(filename) => response.excel_file = Some(filename),
            Err(e) => {
                warn!(error = %e, "Spreadsheet export failed");
                response.export_error = Some(e.to_string());
            }
        }
    }
}
