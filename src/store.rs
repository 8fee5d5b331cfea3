//! Persistence of completed searches.
//!
//! A [`ResearchStore`] keeps one [`ResearchRecord`] per saved search.
//! Records are written once and only ever removed, either per researcher or
//! all at once. [`JsonFileStore`] keeps the collection in a single JSON
//! document on disk.

use crate::error::{AcademicError, Result};
use crate::models::{Platform, Profile, Publication, ResearcherInfo};
use crate::response::SearchType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One saved search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub platform: Platform,
    pub search_type: SearchType,
    #[serde(default)]
    pub researcher_info: Option<ResearcherInfo>,
    pub total_publications: usize,
    #[serde(default)]
    pub filtered_by_keywords: bool,
    #[serde(default)]
    pub original_total: Option<usize>,
    #[serde(default)]
    pub publications: Vec<Publication>,
    /// Profiles returned by a name or topic search, each with its own works
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
    pub execution_time: f64,
}

impl ResearchRecord {
    /// New record stamped with the current time and a fresh id.
    pub fn new(query: &str, platform: Platform, search_type: SearchType) -> Self {
        let timestamp = Utc::now();
        Self {
            id: format!(
                "{:x}{:06x}",
                timestamp.timestamp_millis(),
                rand::random::<u32>() & 0x00ff_ffff
            ),
            timestamp,
            query: query.to_string(),
            platform,
            search_type,
            researcher_info: None,
            total_publications: 0,
            filtered_by_keywords: false,
            original_total: None,
            publications: Vec::new(),
            profiles: Vec::new(),
            execution_time: 0.0,
        }
    }

    /// Researcher name, when the search resolved to a person.
    pub fn researcher_name(&self) -> Option<&str> {
        self.researcher_info
            .as_ref()
            .map(|info| info.name.as_str())
            .filter(|name| !name.trim().is_empty())
    }
}

/// Aggregate view of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_searches: usize,
    pub filtered_searches: usize,
    pub total_publications: usize,
    pub platforms: Vec<Platform>,
    pub latest_search: Option<DateTime<Utc>>,
}

/// All saved searches of one researcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearcherSummary {
    /// Name-derived identifier used for deletion
    pub id: String,
    pub name: String,
    pub institution: Option<String>,
    pub h_index: Option<u64>,
    pub i10_index: Option<u64>,
    pub total_citations: Option<u64>,
    pub research_areas: Vec<String>,
    pub total_publications: usize,
    pub searches: usize,
    pub platforms: Vec<Platform>,
    pub last_search: DateTime<Utc>,
}

/// Outcome of deleting a researcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletedResearcher {
    pub deleted_records: usize,
    pub deleted_publications: usize,
}

/// Identifier derived from a researcher name: lowercase words joined by `-`.
pub fn researcher_id(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn summarize(records: &[ResearchRecord]) -> StoreStats {
    let platforms: BTreeSet<Platform> = records.iter().map(|r| r.platform).collect();
    StoreStats {
        total_searches: records.len(),
        filtered_searches: records.iter().filter(|r| r.filtered_by_keywords).count(),
        total_publications: records.iter().map(|r| r.total_publications).sum(),
        platforms: platforms.into_iter().collect(),
        latest_search: records.iter().map(|r| r.timestamp).max(),
    }
}

/// Group records by researcher, most recently searched first.
///
/// Metrics come from the earliest record that carries them.
pub fn group_researchers(records: &[ResearchRecord]) -> Vec<ResearcherSummary> {
    let mut ordered = records.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|r| r.timestamp);

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summaries: Vec<ResearcherSummary> = Vec::new();
    for record in ordered {
        let (Some(name), Some(info)) = (record.researcher_name(), record.researcher_info.as_ref()) else {
            continue;
        };
        let id = researcher_id(name);
        let slot = *index.entry(id.clone()).or_insert_with(|| {
            summaries.push(ResearcherSummary {
                id,
                name: name.to_string(),
                institution: None,
                h_index: None,
                i10_index: None,
                total_citations: None,
                research_areas: Vec::new(),
                total_publications: 0,
                searches: 0,
                platforms: Vec::new(),
                last_search: record.timestamp,
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[slot];
        summary.searches += 1;
        summary.total_publications += record.total_publications;
        summary.last_search = record.timestamp;
        if !summary.platforms.contains(&record.platform) {
            summary.platforms.push(record.platform);
        }
        if summary.institution.is_none() {
            summary.institution = info.institution.clone();
        }
        summary.h_index = summary.h_index.or(info.h_index);
        summary.i10_index = summary.i10_index.or(info.i10_index);
        summary.total_citations = summary.total_citations.or(info.total_citations);
        if summary.research_areas.is_empty() {
            summary.research_areas = info.research_areas.clone();
        }
    }
    summaries.sort_by(|a, b| b.last_search.cmp(&a.last_search));
    summaries
}

/// Document store for saved searches.
#[async_trait]
pub trait ResearchStore: Send + Sync {
    /// Persist `record`, returning its id.
    async fn save(&self, record: ResearchRecord) -> Result<String>;

    /// Every record, oldest first.
    async fn records(&self) -> Result<Vec<ResearchRecord>>;

    /// Remove every record of the researcher `id` (see [`researcher_id`]).
    async fn delete_researcher(&self, id: &str) -> Result<DeletedResearcher>;

    /// Remove everything, returning the number of records deleted.
    async fn clear(&self) -> Result<usize>;

    async fn stats(&self) -> Result<StoreStats> {
        Ok(summarize(&self.records().await?))
    }

    async fn researchers(&self) -> Result<Vec<ResearcherSummary>> {
        Ok(group_researchers(&self.records().await?))
    }
}

const STORE_FILE: &str = "research.json";

/// Default store path: `~/.rustacademic/research.json`
pub fn default_store_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".rustacademic").join(STORE_FILE))
        .ok_or_else(|| AcademicError::Config("Cannot determine home directory".to_string()))
}

/// Store backed by one JSON file, rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<Vec<ResearchRecord>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file is absent.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| AcademicError::Store(format!("Corrupt store {:?}: {}", path, e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = ?path, records = records.len(), "Opened research store");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &[ResearchRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = ?self.path, records = records.len(), "Persisted research store");
        Ok(())
    }
}

#[async_trait]
impl ResearchStore for JsonFileStore {
    async fn save(&self, record: ResearchRecord) -> Result<String> {
        let mut records = self.records.write().await;
        let id = record.id.clone();
        records.push(record);
        if let Err(e) = self.persist(&records).await {
            records.pop();
            return Err(AcademicError::Store(format!("Failed to save record: {}", e)));
        }
        info!(id = %id, total = records.len(), "Saved research record");
        Ok(id)
    }

    async fn records(&self) -> Result<Vec<ResearchRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn delete_researcher(&self, id: &str) -> Result<DeletedResearcher> {
        let mut records = self.records.write().await;
        let (removed, kept): (Vec<_>, Vec<_>) = records
            .iter()
            .cloned()
            .partition(|r| r.researcher_name().map(researcher_id).as_deref() == Some(id));
        if removed.is_empty() {
            return Err(AcademicError::NotFound(format!("No records for researcher '{}'", id)));
        }

        self.persist(&kept)
            .await
            .map_err(|e| AcademicError::Store(format!("Failed to delete researcher: {}", e)))?;
        *records = kept;

        let outcome = DeletedResearcher {
            deleted_records: removed.len(),
            deleted_publications: removed.iter().map(|r| r.total_publications).sum(),
        };
        info!(id, records = outcome.deleted_records, "Deleted researcher");
        Ok(outcome)
    }

    async fn clear(&self) -> Result<usize> {
        let mut records = self.records.write().await;
        let count = records.len();
        self.persist(&[])
            .await
            .map_err(|e| AcademicError::Store(format!("Failed to clear store: {}", e)))?;
        records.clear();
        info!(deleted = count, "Cleared research store");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str, platform: Platform, publications: usize, h_index: Option<u64>) -> ResearchRecord {
        let mut record = ResearchRecord::new(name, platform, SearchType::Profile);
        record.researcher_info = Some(ResearcherInfo {
            name: name.to_string(),
            h_index,
            ..Default::default()
        });
        record.total_publications = publications;
        record
    }

    #[test]
    fn test_researcher_id() {
        assert_eq!(researcher_id("Maria  da Silva"), "maria-da-silva");
        assert_eq!(researcher_id("José A. Souza"), "josé-a-souza");
    }

    #[test]
    fn test_group_researchers() {
        let mut first = record("Maria Silva", Platform::Scholar, 10, Some(5));
        first.timestamp = Utc::now() - chrono::Duration::hours(1);
        let second = record("Maria Silva", Platform::Lattes, 4, None);
        let mut other = record("João Souza", Platform::Orcid, 2, Some(3));
        other.timestamp = Utc::now() - chrono::Duration::hours(2);
        let mut topic = ResearchRecord::new("aging", Platform::Scholar, SearchType::Topic);
        topic.total_publications = 7;

        let summaries = group_researchers(&[second.clone(), first.clone(), other, topic]);
        assert_eq!(summaries.len(), 2);
        let maria = &summaries[0];
        assert_eq!(maria.id, "maria-silva");
        assert_eq!(maria.searches, 2);
        assert_eq!(maria.total_publications, 14);
        assert_eq!(maria.h_index, Some(5));
        assert_eq!(maria.platforms, vec![Platform::Scholar, Platform::Lattes]);
        assert_eq!(maria.last_search, second.timestamp);
        assert_eq!(summaries[1].id, "joão-souza");
    }

    #[test]
    fn test_group_keeps_earliest_metrics() {
        let mut older = record("Maria Silva", Platform::Scholar, 3, Some(5));
        older.timestamp = Utc::now() - chrono::Duration::days(2);
        if let Some(info) = older.researcher_info.as_mut() {
            info.institution = Some("UnB".into());
        }
        let mut newer = record("Maria Silva", Platform::Lattes, 1, Some(9));
        if let Some(info) = newer.researcher_info.as_mut() {
            info.institution = Some("USP".into());
            info.i10_index = Some(4);
        }

        let summaries = group_researchers(&[newer.clone(), older]);
        assert_eq!(summaries.len(), 1);
        let maria = &summaries[0];
        assert_eq!(maria.h_index, Some(5));
        assert_eq!(maria.institution.as_deref(), Some("UnB"));
        assert_eq!(maria.i10_index, Some(4));
        assert_eq!(maria.last_search, newer.timestamp);
    }

    #[test]
    fn test_group_orders_by_last_search() {
        let mut early = record("Ana Lima", Platform::Orcid, 1, None);
        early.timestamp = Utc::now() - chrono::Duration::days(3);
        let mut late = record("Beatriz Costa", Platform::Lattes, 1, None);
        late.timestamp = Utc::now() - chrono::Duration::days(1);
        let mut ana_again = record("Ana Lima", Platform::Scholar, 1, None);
        ana_again.timestamp = Utc::now();

        let ids: Vec<String> = group_researchers(&[early.clone(), late.clone()])
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["beatriz-costa", "ana-lima"]);

        let ids: Vec<String> = group_researchers(&[early, late, ana_again])
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["ana-lima", "beatriz-costa"]);
    }

    #[test]
    fn test_summarize() {
        let mut filtered = record("A", Platform::Lattes, 3, None);
        filtered.filtered_by_keywords = true;
        let stats = summarize(&[record("B", Platform::Scholar, 5, None), filtered]);
        assert_eq!(stats.total_searches, 2);
        assert_eq!(stats.filtered_searches, 1);
        assert_eq!(stats.total_publications, 8);
        assert_eq!(stats.platforms, vec![Platform::Scholar, Platform::Lattes]);
        assert!(stats.latest_search.is_some());
        assert_eq!(summarize(&[]), StoreStats::default());
    }

    #[tokio::test]
    async fn test_json_store_roundtrip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("store").join(STORE_FILE);

        let store = JsonFileStore::open(&path).await?;
        store.save(record("Maria Silva", Platform::Scholar, 10, Some(5))).await?;
        store.save(record("João Souza", Platform::Orcid, 2, None)).await?;

        let reopened = JsonFileStore::open(&path).await?;
        assert_eq!(reopened.records().await?.len(), 2);
        assert_eq!(reopened.stats().await?.total_publications, 12);

        let deleted = reopened.delete_researcher("maria-silva").await?;
        assert_eq!(deleted, DeletedResearcher { deleted_records: 1, deleted_publications: 10 });
        assert!(matches!(
            reopened.delete_researcher("maria-silva").await,
            Err(AcademicError::NotFound(_))
        ));

        assert_eq!(reopened.clear().await?, 1);
        assert!(JsonFileStore::open(&path).await?.records().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_store_is_reported() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(STORE_FILE);
        std::fs::write(&path, "{not json")?;
        assert!(matches!(JsonFileStore::open(&path).await, Err(AcademicError::Store(_))));
        Ok(())
    }
}
