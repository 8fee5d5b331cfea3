//! Summary statistics over a raw search response.
//!
//! Used to display totals next to the results and to decide whether an
//! export makes sense at all.

use crate::models::{field, Platform};
use crate::normalize::array_at;
use serde::Serialize;
use serde_json::Value;

/// Totals shown on the dashboard and used to gate exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStatistics {
    pub total_authors: u64,
    pub total_publications: u64,
    pub total_citations: u64,
    pub max_h_index: u64,
    pub max_i10_index: u64,
}

impl ExportStatistics {
    /// An export is possible once there is at least one author or publication.
    pub fn can_export(&self) -> bool {
        self.total_authors > 0 || self.total_publications > 0
    }

    fn add_publications(&mut self, records: &[Value]) {
        self.total_publications = self.total_publications.saturating_add(records.len() as u64);
        self.total_citations = self.total_citations.saturating_add(saturating_total(records, "citations", "cited_by"));
    }

    /// `count_works` is false when the enclosing block already listed the
    /// profile's works as publications.
    fn add_profiles(&mut self, records: &[Value], count_works: bool) {
        self.total_authors = self.total_authors.saturating_add(records.len() as u64);
        for record in records {
            if count_works {
                if let Some(obj) = record.as_object() {
                    let works = field::count(obj, &["total_publications"]).unwrap_or(0);
                    self.total_publications = self.total_publications.saturating_add(works);
                }
            }
            self.add_metrics(record);
        }
    }

    /// Author summaries from a single-platform list also contribute their
    /// own citation totals.
    fn add_authors(&mut self, records: &[Value]) {
        self.add_profiles(records, true);
        self.total_citations = self
            .total_citations
            .saturating_add(saturating_total(records, "total_citations", "total_citations"));
    }

    fn add_metrics(&mut self, block: &Value) {
        let Some(obj) = block.as_object() else {
            return;
        };
        if let Some(h) = field::count(obj, &["h_index"]) {
            self.max_h_index = self.max_h_index.max(h);
        }
        if let Some(i10) = field::count(obj, &["i10_index"]) {
            self.max_i10_index = self.max_i10_index.max(i10);
        }
    }

    /// Tally one response block: its publications, its profile lists and
    /// any researcher summary attached to it.
    fn add_block(&mut self, block: &Value, profiles_key: &str) {
        let publication_paths: [&[&str]; 2] = [&["publications"], &["data", "publications"]];
        let mut listed_publications = false;
        for path in publication_paths {
            if let Some(records) = array_at(block, path) {
                listed_publications |= !records.is_empty();
                self.add_publications(records);
            }
        }

        let mut profile_paths = vec![vec![profiles_key], vec!["data", profiles_key]];
        if profiles_key != "profiles" {
            profile_paths.push(vec!["profiles"]);
        }
        for path in &profile_paths {
            if let Some(records) = array_at(block, path) {
                self.add_profiles(records, !listed_publications);
            }
        }

        for key in ["researcher_info", "author_profile"] {
            if let Some(info) = block.get(key) {
                self.add_metrics(info);
            }
            if let Some(info) = block.get("data").and_then(|d| d.get(key)) {
                self.add_metrics(info);
            }
        }
    }
}

fn saturating_total(records: &[Value], key: &str, alias: &str) -> u64 {
    records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|r| field::count(r, &[key, alias]))
        .fold(0u64, u64::saturating_add)
}

/// Compute statistics from any response shape.
///
/// Missing or empty input yields all zeros.
pub fn compute(response: &Value) -> ExportStatistics {
    let mut stats = ExportStatistics::default();
    match response {
        Value::Array(authors) => stats.add_authors(authors),
        Value::Object(obj) => {
            if let Some(Value::Array(authors)) = obj.get("authors") {
                stats.add_authors(authors);
            } else if let Some(by_platform) = obj.get("results_by_platform").filter(|v| v.is_object()) {
                for platform in Platform::ALL {
                    if let Some(block) = by_platform.get(platform.as_str()) {
                        stats.add_block(block, platform.profiles_key());
                    }
                }
            } else {
                stats.add_block(response, "profiles");
            }
        }
        _ => {}
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Publication};
    use crate::response::{PlatformResult, SearchResponse, SearchType};
    use crate::source::SourceResults;
    use serde_json::json;

    fn resolved_profile() -> SourceResults {
        let publications = vec![
            Publication {
                title: "Frailty".into(),
                citations: Some(5),
                ..Default::default()
            },
            Publication {
                title: "Falls".into(),
                citations: Some(1),
                ..Default::default()
            },
        ];
        SourceResults::from_profile(Profile {
            name: "Ana".into(),
            h_index: Some(3),
            total_publications: Some(publications.len() as u64),
            publications,
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        assert_eq!(compute(&Value::Null), ExportStatistics::default());
        assert_eq!(compute(&json!({})), ExportStatistics::default());
        assert_eq!(compute(&json!([])), ExportStatistics::default());
        assert!(!compute(&Value::Null).can_export());
    }

    #[test]
    fn test_comprehensive_citations() {
        let stats = compute(&json!({
            "results_by_platform": {"scholar": {"publications": [{"cited_by": 3}, {"cited_by": 7}]}}
        }));
        assert_eq!(stats.total_citations, 10);
        assert_eq!(stats.total_publications, 2);
        assert!(stats.can_export());
    }

    #[test]
    fn test_comprehensive_profiles_per_platform() {
        let stats = compute(&json!({
            "results_by_platform": {
                "scholar": {"publications": [{"citations": "12"}], "researcher_info": {"h_index": 9}},
                "lattes": {"lattes_profiles": [
                    {"name": "A", "total_publications": 30, "h_index": 4},
                    {"name": "B"}
                ]},
                "orcid": {"orcid_profiles": [{"name": "C", "i10_index": 5}], "error": "timeout"}
            }
        }));
        assert_eq!(stats.total_authors, 3);
        assert_eq!(stats.total_publications, 31);
        assert_eq!(stats.total_citations, 12);
        assert_eq!(stats.max_h_index, 9);
        assert_eq!(stats.max_i10_index, 5);
    }

    #[test]
    fn test_author_array_without_h_index() {
        let stats = compute(&json!([{"name": "A"}, {"name": "B"}]));
        assert_eq!(stats.total_authors, 2);
        assert_eq!(stats.max_h_index, 0);
        assert!(stats.can_export());
    }

    #[test]
    fn test_author_list_response() {
        let stats = compute(&json!({
            "success": true,
            "authors": [
                {"name": "A", "h_index": 20, "total_citations": 1500},
                {"name": "B", "h_index": 35, "i10_index": 60, "total_citations": 500}
            ]
        }));
        assert_eq!(stats.total_authors, 2);
        assert_eq!(stats.max_h_index, 35);
        assert_eq!(stats.max_i10_index, 60);
        assert_eq!(stats.total_citations, 2000);
    }

    #[test]
    fn test_single_platform_object() {
        let stats = compute(&json!({
            "platform": "scholar",
            "researcher_info": {"name": "A", "h_index": 15, "i10_index": 22},
            "data": {"publications": [{"title": "x", "cited_by": 4}]}
        }));
        assert_eq!(stats.total_publications, 1);
        assert_eq!(stats.total_citations, 4);
        assert_eq!(stats.max_h_index, 15);
        assert_eq!(stats.max_i10_index, 22);
        assert_eq!(stats.total_authors, 0);
    }

    #[test]
    fn test_resolved_profile_works_counted_once() -> serde_json::Result<()> {
        let response = SearchResponse::from_results("Ana", Platform::Orcid, SearchType::Profile, resolved_profile());
        let stats = compute(&serde_json::to_value(&response)?);
        assert_eq!(stats.total_publications, 2);
        assert_eq!(stats.total_citations, 6);
        assert_eq!(stats.total_authors, 1);

        let mut comprehensive = SearchResponse::new("Ana", None, SearchType::Both);
        comprehensive
            .results_by_platform
            .insert(Platform::Lattes, PlatformResult::from_results(Platform::Lattes, resolved_profile()));
        let stats = compute(&serde_json::to_value(&comprehensive)?);
        assert_eq!(stats.total_publications, 2);
        Ok(())
    }

    #[test]
    fn test_huge_counts_saturate() {
        let stats = compute(&json!({
            "publications": [{"title": "a", "citations": u64::MAX}, {"title": "b", "citations": 1}],
            "profiles": [{"name": "A", "total_publications": u64::MAX}]
        }));
        assert_eq!(stats.total_citations, u64::MAX);
        assert_eq!(stats.total_publications, 2);

        let stats = compute(&json!([
            {"name": "A", "total_citations": u64::MAX, "total_publications": u64::MAX},
            {"name": "B", "total_citations": 9, "total_publications": 1}
        ]));
        assert_eq!(stats.total_citations, u64::MAX);
        assert_eq!(stats.total_publications, u64::MAX);
    }
}
