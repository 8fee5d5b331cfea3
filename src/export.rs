//! Spreadsheet export.
//!
//! Spreadsheets are CSV files: one per search, named
//! `<prefix>_<query>_<timestamp>.csv` inside the export directory, and a
//! consolidated sheet over every stored record that is streamed back to the
//! caller instead of being kept on disk.

use crate::error::{AcademicError, Result};
use crate::models::{Platform, Profile, Publication, ResearcherInfo};
use crate::response::SearchResponse;
use crate::store::ResearchRecord;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column order of a per-search sheet
pub const SEARCH_COLUMNS: &[&str] = &[
    "researcher", "institution", "h_index", "i10_index", "total_citations", "title", "authors",
    "venue", "year", "citations", "doi", "link", "platform", "keywords_found",
];

/// Column order of the consolidated sheet
pub const CONSOLIDATED_COLUMNS: &[&str] = &[
    "researcher", "institution", "h_index", "i10_index", "total_citations", "title", "authors",
    "venue", "year", "citations", "search_type", "platform", "keywords_found", "searched_at",
];

const MAX_QUERY_CHARS: usize = 50;

#[derive(Debug, Default, Serialize)]
struct SearchRow {
    researcher: String,
    institution: String,
    h_index: Option<u64>,
    i10_index: Option<u64>,
    total_citations: Option<u64>,
    title: String,
    authors: String,
    venue: String,
    year: Option<i32>,
    citations: Option<u64>,
    doi: String,
    link: String,
    platform: String,
    keywords_found: String,
}

#[derive(Debug, Serialize)]
struct ConsolidatedRow {
    researcher: String,
    institution: String,
    h_index: Option<u64>,
    i10_index: Option<u64>,
    total_citations: Option<u64>,
    title: String,
    authors: String,
    venue: String,
    year: Option<i32>,
    citations: Option<u64>,
    search_type: String,
    platform: String,
    keywords_found: String,
    searched_at: String,
}

/// Writes search results to CSV spreadsheets.
#[derive(Debug, Clone)]
pub struct SpreadsheetExporter {
    dir: PathBuf,
}

impl SpreadsheetExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one sheet for `response` and return the file name.
    pub fn export_search(&self, response: &SearchResponse) -> Result<String> {
        let rows = search_rows(response);
        if rows.is_empty() {
            return Err(AcademicError::Export("No results to export".to_string()));
        }

        std::fs::create_dir_all(&self.dir)?;
        let filename = search_filename(response, &Local::now().format("%Y%m%d_%H%M%S").to_string());
        let path = self.dir.join(&filename);

        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(&path)?;
        for row in &rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;

        info!(path = ?path, rows = rows.len(), "Exported search spreadsheet");
        Ok(filename)
    }

    /// Render every stored record into one sheet, returning its suggested
    /// file name and bytes.
    pub fn export_consolidated(&self, records: &[ResearchRecord]) -> Result<(String, Vec<u8>)> {
        let rows = consolidated_rows(records);
        if rows.is_empty() {
            return Err(AcademicError::Export("No stored research to export".to_string()));
        }

        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(Vec::new());
        for row in &rows {
            wtr.serialize(row)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AcademicError::Export(format!("Failed to finish spreadsheet: {}", e)))?;

        let filename = format!("consolidated_research_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
        info!(records = records.len(), rows = rows.len(), "Built consolidated spreadsheet");
        Ok((filename, bytes))
    }
}

/// Query reduced to a file-name-safe fragment.
fn clean_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .take(MAX_QUERY_CHARS)
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    if cleaned.is_empty() {
        "query".to_string()
    } else {
        cleaned
    }
}

fn search_filename(response: &SearchResponse, timestamp: &str) -> String {
    let scope = response
        .platform
        .map(|p| p.as_str())
        .unwrap_or("comprehensive");
    format!(
        "{}_{}_{}_{}.csv",
        scope,
        response.search_type,
        clean_query(&response.query),
        timestamp
    )
}

fn join(values: &[String]) -> String {
    values.join("; ")
}

fn publication_row(researcher: Option<&ResearcherInfo>, platform: Platform, publication: &Publication) -> SearchRow {
    SearchRow {
        researcher: researcher.map(|r| r.name.clone()).unwrap_or_default(),
        institution: researcher.and_then(|r| r.institution.clone()).unwrap_or_default(),
        h_index: researcher.and_then(|r| r.h_index),
        i10_index: researcher.and_then(|r| r.i10_index),
        total_citations: researcher.and_then(|r| r.total_citations),
        title: publication.title.clone(),
        authors: publication.authors.clone().unwrap_or_default(),
        venue: publication.venue.clone().unwrap_or_default(),
        year: publication.year,
        citations: publication.citations,
        doi: publication.doi.clone().unwrap_or_default(),
        link: publication.display_link().unwrap_or_default().to_string(),
        platform: publication.platform.unwrap_or(platform).to_string(),
        keywords_found: join(&publication.keywords_found),
    }
}

fn profile_row(platform: Platform, profile: &Profile) -> SearchRow {
    SearchRow {
        researcher: profile.name.clone(),
        institution: profile.institution.clone().unwrap_or_default(),
        h_index: profile.h_index,
        i10_index: profile.i10_index,
        total_citations: profile.total_citations,
        link: profile.display_link(platform).unwrap_or_default(),
        platform: platform.to_string(),
        ..Default::default()
    }
}

/// One row per publication, including the works nested in each profile,
/// which carry that profile in the researcher columns. A profile without
/// works gets a row of its own when the response lists no top-level
/// publications.
fn search_rows(response: &SearchResponse) -> Vec<SearchRow> {
    let mut rows: Vec<SearchRow> = Vec::new();
    let own = response.researcher_info.as_ref();
    for (platform, publication) in response.publications() {
        let researcher = response
            .results_by_platform
            .get(&platform)
            .and_then(|r| r.researcher_info.as_ref())
            .or(own);
        rows.push(publication_row(researcher, platform, publication));
    }

    let has_publications = !rows.is_empty();
    for (platform, profile) in response.profiles() {
        if profile.publications.is_empty() {
            if !has_publications {
                rows.push(profile_row(platform, profile));
            }
            continue;
        }
        let researcher = ResearcherInfo::from(profile);
        rows.extend(
            profile
                .publications
                .iter()
                .map(|publication| publication_row(Some(&researcher), platform, publication)),
        );
    }
    rows
}

/// Scrapers sometimes put "Authors - Venue" into the venue and only the
/// researcher's name into the authors column.
fn correct_authors_venue(researcher: &str, authors: Option<&str>, venue: Option<&str>) -> (String, String) {
    let authors = authors.unwrap_or_default().trim();
    let venue = venue.unwrap_or_default().trim();
    let repeats_researcher = authors.is_empty() || authors.eq_ignore_ascii_case(researcher.trim());
    if repeats_researcher {
        if let Some((real_authors, real_venue)) = venue.split_once(" - ") {
            return (real_authors.trim().to_string(), real_venue.trim().to_string());
        }
    }
    (authors.to_string(), venue.to_string())
}

fn consolidated_row(record: &ResearchRecord, info: Option<&ResearcherInfo>, publication: &Publication) -> ConsolidatedRow {
    let researcher = info.map(|i| i.name.clone()).unwrap_or_default();
    let (authors, venue) =
        correct_authors_venue(&researcher, publication.authors.as_deref(), publication.venue.as_deref());
    ConsolidatedRow {
        institution: info.and_then(|i| i.institution.clone()).unwrap_or_default(),
        h_index: info.and_then(|i| i.h_index),
        i10_index: info.and_then(|i| i.i10_index),
        total_citations: info.and_then(|i| i.total_citations),
        researcher,
        title: publication.title.clone(),
        authors,
        venue,
        year: publication.year,
        citations: publication.citations,
        search_type: record.search_type.to_string(),
        platform: publication.platform.unwrap_or(record.platform).to_string(),
        keywords_found: join(&publication.keywords_found),
        searched_at: record.timestamp.format("%d/%m/%Y %H:%M").to_string(),
    }
}

fn consolidated_rows(records: &[ResearchRecord]) -> Vec<ConsolidatedRow> {
    let mut rows = Vec::new();
    for record in records {
        let info = record.researcher_info.as_ref();
        rows.extend(record.publications.iter().map(|p| consolidated_row(record, info, p)));
        for profile in &record.profiles {
            let info = ResearcherInfo::from(profile);
            rows.extend(profile.publications.iter().map(|p| consolidated_row(record, Some(&info), p)));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::SearchType;
    use crate::source::SourceResults;
    use tempfile::TempDir;

    fn publication(title: &str) -> Publication {
        Publication {
            title: title.to_string(),
            authors: Some("A Silva, B Souza".into()),
            year: Some(2020),
            citations: Some(4),
            keywords_found: vec!["aging".into(), "frailty".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("Maria  da Silva!"), "Maria_da_Silva");
        assert_eq!(clean_query("???"), "query");
        assert_eq!(clean_query(&"x".repeat(80)).len(), MAX_QUERY_CHARS);
    }

    #[test]
    fn test_export_search_writes_file() -> Result<()> {
        let dir = TempDir::new()?;
        let exporter = SpreadsheetExporter::new(dir.path());
        let results = SourceResults {
            publications: vec![publication("Aging in Brazil"), publication("Sarcopenia")],
            ..Default::default()
        };
        let response = SearchResponse::from_results("aging", Platform::Scholar, SearchType::Topic, results);

        let filename = exporter.export_search(&response)?;
        assert!(filename.starts_with("scholar_topic_aging_"));
        assert!(filename.ends_with(".csv"));

        let content = std::fs::read_to_string(dir.path().join(&filename))?;
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(SEARCH_COLUMNS.join(",").as_str()));
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("aging; frailty"));
        Ok(())
    }

    #[test]
    fn test_export_search_rejects_empty() {
        let exporter = SpreadsheetExporter::new(std::env::temp_dir());
        let response = SearchResponse::new("nobody", Some(Platform::Lattes), SearchType::Author);
        let err = exporter.export_search(&response).expect_err("empty export");
        assert!(matches!(err, AcademicError::Export(_)));
    }

    #[test]
    fn test_profile_rows_when_no_publications() {
        let results = SourceResults {
            profiles: vec![Profile {
                name: "Ana".into(),
                orcid_id: Some("0000-0001-2345-6789".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let response = SearchResponse::from_results("Ana", Platform::Orcid, SearchType::Author, results);
        let rows = search_rows(&response);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].link, "https://orcid.org/0000-0001-2345-6789");
    }

    #[test]
    fn test_author_venue_correction() {
        let (authors, venue) = correct_authors_venue(
            "Maria Silva",
            Some("maria silva"),
            Some("M Silva, J Souza - Revista de Geriatria, 2019"),
        );
        assert_eq!(authors, "M Silva, J Souza");
        assert_eq!(venue, "Revista de Geriatria, 2019");

        let (authors, venue) =
            correct_authors_venue("Maria Silva", Some("M Silva, J Souza"), Some("Rev - Geriatria"));
        assert_eq!(authors, "M Silva, J Souza");
        assert_eq!(venue, "Rev - Geriatria");
    }

    #[test]
    fn test_consolidated_export() -> Result<()> {
        let exporter = SpreadsheetExporter::new(std::env::temp_dir());
        assert!(exporter.export_consolidated(&[]).is_err());

        let mut record = ResearchRecord::new("Maria Silva", Platform::Scholar, SearchType::Profile);
        record.researcher_info = Some(ResearcherInfo {
            name: "Maria Silva".into(),
            h_index: Some(12),
            ..Default::default()
        });
        record.publications = vec![Publication {
            title: "Aging".into(),
            authors: Some("Maria Silva".into()),
            venue: Some("M Silva, P Lima - Gerontology".into()),
            ..Default::default()
        }];

        let (filename, bytes) = exporter.export_consolidated(&[record])?;
        assert!(filename.starts_with("consolidated_research_"));
        let content = String::from_utf8(bytes).map_err(|e| AcademicError::Export(e.to_string()))?;
        assert!(content.starts_with(&CONSOLIDATED_COLUMNS.join(",")));
        assert!(content.contains("\"M Silva, P Lima\",Gerontology"));
        assert!(content.contains(",12,"));
        Ok(())
    }

    fn curriculum(name: &str, institution: &str, titles: &[&str]) -> Profile {
        Profile {
            name: name.into(),
            institution: Some(institution.into()),
            lattes_id: Some("1234567890123456".into()),
            publications: titles.iter().map(|t| publication(t)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_nested_profile_publications_get_rows() {
        let results = SourceResults {
            profiles: vec![
                curriculum("Ana Lima", "UnB", &["Quedas em idosos", "Fragilidade"]),
                curriculum("Beatriz Costa", "USP", &["Sarcopenia", "Demência"]),
                curriculum("Carla Dias", "UFMG", &[]),
            ],
            ..Default::default()
        };
        let response = SearchResponse::from_results("idosos", Platform::Lattes, SearchType::Author, results);
        let rows = search_rows(&response);
        assert_eq!(rows.len(), 5);
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Quedas em idosos", "Fragilidade", "Sarcopenia", "Demência", ""]);
        assert_eq!(rows[2].researcher, "Beatriz Costa");
        assert_eq!(rows[2].institution, "USP");
        assert_eq!(rows[4].researcher, "Carla Dias");
        assert!(rows.iter().all(|r| r.platform == "lattes"));
    }

    #[test]
    fn test_resolved_profile_is_not_repeated() {
        let results = SourceResults::from_profile(curriculum("Ana Lima", "UnB", &["Quedas em idosos"]));
        let response = SearchResponse::from_results("Ana Lima", Platform::Lattes, SearchType::Profile, results);
        let rows = search_rows(&response);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].researcher, "Ana Lima");
    }

    #[test]
    fn test_consolidated_includes_stored_profiles() -> Result<()> {
        let exporter = SpreadsheetExporter::new(std::env::temp_dir());
        let mut record = ResearchRecord::new("idosos", Platform::Lattes, SearchType::Author);
        record.profiles = vec![
            curriculum("Ana Lima", "UnB", &["Quedas em idosos"]),
            curriculum("Beatriz Costa", "USP", &["Sarcopenia"]),
        ];

        let (_, bytes) = exporter.export_consolidated(&[record])?;
        let content = String::from_utf8(bytes).map_err(|e| AcademicError::Export(e.to_string()))?;
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("Ana Lima,UnB"));
        assert!(content.contains("Beatriz Costa,USP"));
        assert!(content.contains("Sarcopenia"));
        Ok(())
    }
}
