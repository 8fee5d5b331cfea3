//! Domain records shared by the backend and the dashboard client.
//!
//! Upstream payloads are loosely shaped: the same field may appear under
//! several names, numbers may arrive as strings, and lists may be a single
//! string. The `from_json` constructors read a raw JSON object leniently and
//! fold synonyms into one canonical field; the derived serde impls describe
//! the canonical form this crate emits and persists.

use crate::error::AcademicError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One of the three upstream data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Scholarly citation search engine
    Scholar,
    /// National researcher registry (CNPq Lattes)
    Lattes,
    /// Global researcher identifier registry
    Orcid,
}

impl Platform {
    /// All platforms in fan-out and display order.
    pub const ALL: [Platform; 3] = [Platform::Scholar, Platform::Lattes, Platform::Orcid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Scholar => "scholar",
            Platform::Lattes => "lattes",
            Platform::Orcid => "orcid",
        }
    }

    /// Key under which this platform's profile list travels inside
    /// `results_by_platform`.
    pub fn profiles_key(&self) -> &'static str {
        match self {
            Platform::Scholar => "profiles",
            Platform::Lattes => "lattes_profiles",
            Platform::Orcid => "orcid_profiles",
        }
    }

    /// Lenient lookup used on payload tags; unknown names yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "scholar" | "google_scholar" | "gscholar" => Some(Platform::Scholar),
            "lattes" => Some(Platform::Lattes),
            "orcid" => Some(Platform::Orcid),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AcademicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::from_tag(s)
            .ok_or_else(|| AcademicError::Validation(format!("Unknown platform '{}'", s)))
    }
}

/// A scholarly work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<u64>,
    /// Journal, conference or other venue
    #[serde(skip_serializing_if = "Option::is_none", alias = "journal")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Filter keywords that matched this work
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords_found: Vec<String>,
}

impl Publication {
    /// Build a publication from a loosely shaped JSON object.
    ///
    /// Returns `None` when no usable title is present.
    pub fn from_json(obj: &Map<String, Value>) -> Option<Self> {
        let title = field::text(obj, &["title"])?;
        Some(Self {
            title,
            authors: field::text(obj, &["authors", "author"]),
            year: field::year(obj, &["year", "publication_year"]),
            citations: field::count(obj, &["citations", "cited_by"]),
            venue: field::text(obj, &["journal", "venue", "publication"]),
            link: field::text(obj, &["link"]),
            url: field::text(obj, &["url"]),
            snippet: field::text(obj, &["snippet", "abstract"]),
            doi: field::text(obj, &["doi"]),
            page_number: field::count(obj, &["page_number"]).and_then(|n| u32::try_from(n).ok()),
            platform: field::text(obj, &["platform"]).and_then(|p| Platform::from_tag(&p)),
            keywords_found: field::list(obj, &["keywords_found"]),
        })
    }

    /// Display link: `link`, falling back to `url`.
    pub fn display_link(&self) -> Option<&str> {
        self.link.as_deref().or(self.url.as_deref())
    }
}

/// A researcher record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub research_areas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<String>,
    /// Registry identifier (Lattes CV id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lattes_id: Option<String>,
    /// Global researcher identifier (ORCID iD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid_id: Option<String>,
    /// Scholar user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lattes_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<Publication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i10_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_citations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_publications: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_projects: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl Profile {
    /// Build a profile from a loosely shaped JSON object.
    ///
    /// Returns `None` when no usable name is present.
    pub fn from_json(obj: &Map<String, Value>) -> Option<Self> {
        let name = field::text(obj, &["name"])?;
        let mut research_areas = field::list(obj, &["research_areas", "keywords"]);
        if research_areas.is_empty() {
            research_areas = field::list(obj, &["area"]);
        }
        let publications = obj
            .get("publications")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(Publication::from_json)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            name,
            institution: field::text(obj, &["institution", "current_institution", "affiliation"]),
            position: field::text(obj, &["position", "current_position"]),
            research_areas,
            summary: field::text(obj, &["summary", "biography", "description"]),
            education: field::list(obj, &["education"]),
            lattes_id: field::text(obj, &["lattes_id"]),
            orcid_id: field::text(obj, &["orcid_id"]),
            author_id: field::text(obj, &["author_id"]),
            url: field::text(obj, &["url", "profile_url"]),
            lattes_url: field::text(obj, &["lattes_url"]),
            publications,
            h_index: field::count(obj, &["h_index"]),
            i10_index: field::count(obj, &["i10_index"]),
            total_citations: field::count(obj, &["total_citations"]),
            total_publications: field::count(obj, &["total_publications"]),
            total_projects: field::count(obj, &["total_projects"]),
            last_update: field::text(obj, &["last_update"]),
            platform: field::text(obj, &["platform"]).and_then(|p| Platform::from_tag(&p)),
        })
    }

    /// Display link for a profile seen on `platform`.
    ///
    /// ORCID profiles with an identifier always link to the public registry
    /// page; everything else uses `url`, then `lattes_url`.
    pub fn display_link(&self, platform: Platform) -> Option<String> {
        if platform == Platform::Orcid {
            if let Some(id) = &self.orcid_id {
                return Some(orcid_url(id));
            }
        }
        self.url.clone().or_else(|| self.lattes_url.clone())
    }
}

/// Public registry URL for an ORCID iD.
pub fn orcid_url(orcid_id: &str) -> String {
    format!("https://orcid.org/{}", orcid_id)
}

/// Condensed researcher block attached to single-profile responses and
/// persisted records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearcherInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i10_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_citations: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub research_areas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lattes_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl From<&Profile> for ResearcherInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            institution: profile.institution.clone(),
            h_index: profile.h_index,
            i10_index: profile.i10_index,
            total_citations: profile.total_citations,
            research_areas: profile.research_areas.clone(),
            last_update: profile.last_update.clone(),
            orcid_id: profile.orcid_id.clone(),
            lattes_id: profile.lattes_id.clone(),
            profile_url: profile.url.clone().or_else(|| profile.lattes_url.clone()),
        }
    }
}

/// Scholar author card from an author-name search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorSummary {
    pub author_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_citations: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub research_areas: Vec<String>,
    pub profile_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i10_index: Option<u64>,
}

impl From<&AuthorSummary> for Profile {
    fn from(author: &AuthorSummary) -> Self {
        Self {
            name: author.name.clone(),
            institution: author.institution.clone(),
            research_areas: author.research_areas.clone(),
            author_id: Some(author.author_id.clone()),
            url: Some(author.profile_url.clone()),
            h_index: author.h_index,
            i10_index: author.i10_index,
            total_citations: author.total_citations,
            platform: Some(Platform::Scholar),
            ..Default::default()
        }
    }
}

/// Explicit record kind carried in emitted payloads.
pub trait RecordKind {
    const KIND: &'static str;
}

impl RecordKind for Publication {
    const KIND: &'static str = "publication";
}

impl RecordKind for Profile {
    const KIND: &'static str = "profile";
}

/// Serializers that stamp each record with its `kind` so consumers never
/// have to guess between publication and profile.
pub(crate) mod tagged {
    use super::RecordKind;
    use serde::{Serialize, Serializer};

    #[derive(Serialize)]
    struct Tagged<'a, T> {
        kind: &'static str,
        #[serde(flatten)]
        record: &'a T,
    }

    // serde hands `serialize_with` a reference to the field itself
    #[allow(clippy::ptr_arg)]
    pub fn records<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize + RecordKind,
    {
        serializer.collect_seq(items.iter().map(|record| Tagged {
            kind: T::KIND,
            record,
        }))
    }
}

/// Lenient field readers over raw JSON objects.
pub(crate) mod field {
    use serde_json::{Map, Value};

    /// First key holding a non-empty string (or a number, stringified).
    pub fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match obj.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// First key holding a non-negative count, accepting numeric strings
    /// such as `"1,234"`.
    pub fn count(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
        keys.iter().find_map(|key| as_count(obj.get(*key)?))
    }

    pub fn as_count(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => {
                let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                if digits.is_empty() {
                    None
                } else {
                    digits.parse().ok()
                }
            }
            _ => None,
        }
    }

    /// First key holding a four-digit year, as a number or inside a string.
    pub fn year(obj: &Map<String, Value>, keys: &[&str]) -> Option<i32> {
        keys.iter().find_map(|key| match obj.get(*key)? {
            Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => find_year(s),
            _ => None,
        })
    }

    pub fn find_year(text: &str) -> Option<i32> {
        let chars: Vec<char> = text.chars().collect();
        chars.windows(4).enumerate().find_map(|(i, w)| {
            let bounded_left = i == 0 || !chars[i - 1].is_ascii_digit();
            let bounded_right = !matches!(chars.get(i + 4), Some(c) if c.is_ascii_digit());
            if bounded_left && bounded_right && w.iter().all(char::is_ascii_digit) {
                w.iter().collect::<String>().parse().ok()
            } else {
                None
            }
        })
    }

    /// First key holding a list; strings are taken as single entries and
    /// objects are flattened to their string values.
    pub fn list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
        for key in keys {
            let entries: Vec<String> = match obj.get(*key) {
                Some(Value::Array(items)) => items.iter().filter_map(entry_text).collect(),
                Some(value) => entry_text(value).into_iter().collect(),
                None => Vec::new(),
            };
            if !entries.is_empty() {
                return entries;
            }
        }
        Vec::new()
    }

    fn entry_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => {
                let parts: Vec<&str> = map
                    .values()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" - "))
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_citation_synonyms_first_non_empty_wins() {
        let publication =
            Publication::from_json(&obj(json!({"title": "A", "citations": "", "cited_by": 5})))
                .expect("publication");
        assert_eq!(publication.citations, Some(5));

        let publication =
            Publication::from_json(&obj(json!({"title": "A", "citations": 2, "cited_by": 5})))
                .expect("publication");
        assert_eq!(publication.citations, Some(2));
    }

    #[test]
    fn test_publication_requires_title() {
        assert!(Publication::from_json(&obj(json!({"authors": "X"}))).is_none());
        assert!(Publication::from_json(&obj(json!({"title": "   "}))).is_none());
    }

    #[test]
    fn test_profile_synonyms() {
        let profile = Profile::from_json(&obj(json!({
            "name": "Ana",
            "current_institution": "UnB",
            "current_position": "Professor",
            "biography": "Works on aging",
            "area": "Gerontologia",
            "h_index": "12"
        })))
        .expect("profile");
        assert_eq!(profile.institution.as_deref(), Some("UnB"));
        assert_eq!(profile.position.as_deref(), Some("Professor"));
        assert_eq!(profile.summary.as_deref(), Some("Works on aging"));
        assert_eq!(profile.research_areas, vec!["Gerontologia".to_string()]);
        assert_eq!(profile.h_index, Some(12));
    }

    #[test]
    fn test_orcid_link_is_synthesized() {
        let profile = Profile {
            name: "X".into(),
            orcid_id: Some("0000-0002-1825-0097".into()),
            ..Default::default()
        };
        assert_eq!(
            profile.display_link(Platform::Orcid).as_deref(),
            Some("https://orcid.org/0000-0002-1825-0097")
        );
        assert_eq!(profile.display_link(Platform::Lattes), None);
    }

    #[test]
    fn test_year_parsing() {
        assert_eq!(field::find_year("Revista X, 2019"), Some(2019));
        assert_eq!(field::find_year("vol 123456"), None);
        assert_eq!(field::find_year(""), None);
    }

    #[test]
    fn test_platform_tags() {
        assert_eq!(Platform::from_tag("google_scholar"), Some(Platform::Scholar));
        assert_eq!(Platform::from_tag("ORCID"), Some(Platform::Orcid));
        assert!("error".parse::<Platform>().is_err());
    }
}
