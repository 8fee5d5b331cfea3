//! Keyword filter for aging-research publications.
//!
//! Matches whole words, case-insensitively, over a publication's title,
//! authors, venue and snippet. The default vocabulary covers Portuguese,
//! English and Spanish terms.

use crate::error::{AcademicError, Result};
use crate::models::Publication;
use regex::Regex;

/// Default vocabulary.
pub const AGING_KEYWORDS: &[&str] = &[
    "UniSER", "UnB",
    // elderly
    "idoso", "idosa", "idosos", "idosas", "pessoa idosa", "terceira idade", "melhor idade",
    "longevo", "elderly", "older adult", "older adults", "senior", "aged", "third age",
    "long-lived", "anciano", "persona mayor", "adulto mayor", "tercera edad",
    // aging
    "envelhecimento", "envelhecer", "longevidade", "aging", "ageing", "longevity",
    "envejecimiento", "envejecer", "longevidad",
    // senescence
    "senescência", "senescente", "senescence", "senescent", "senescencia", "senilidade",
    "senility",
    // gerontology and geriatrics
    "gerontologia", "gerontológico", "gerontology", "gerontological", "gerontología",
    "geriatria", "geriátrico", "geriatrics", "geriatric", "geriatría",
    // quality of life
    "qualidade de vida", "bem-estar", "quality of life", "well-being", "wellness",
    "calidad de vida", "bienestar", "saúde do idoso", "elderly health", "senior health",
    "salud del adulto mayor", "autonomia", "capacidade funcional", "autonomy",
    "functional capacity",
    // lifelong learning and inclusion
    "educação permanente", "educação continuada", "lifelong learning", "continuing education",
    "educación permanente", "inclusão social", "inclusão digital", "social inclusion",
    "digital inclusion", "inclusión social", "universidade aberta", "open university",
];

/// Compiled whole-word keyword matcher.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    pattern: Regex,
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Build a filter over `keywords`.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        let mut keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(AcademicError::Validation("Keyword list is empty".to_string()));
        }
        // longest first so multi-word terms win over their prefixes
        keywords.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        keywords.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
            .map_err(|e| AcademicError::Config(format!("Invalid keyword pattern: {}", e)))?;

        Ok(Self { pattern, keywords })
    }

    /// Filter over [`AGING_KEYWORDS`].
    pub fn aging() -> Result<Self> {
        Self::new(AGING_KEYWORDS)
    }

    /// Keywords found in `text`, in vocabulary spelling, without repeats.
    pub fn find(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for m in self.pattern.find_iter(text) {
            let hit = m.as_str().to_lowercase();
            let keyword = self
                .keywords
                .iter()
                .find(|k| k.to_lowercase() == hit)
                .cloned()
                .unwrap_or(hit);
            if !found.contains(&keyword) {
                found.push(keyword);
            }
        }
        found
    }

    /// Keywords found anywhere in a publication's searchable text.
    pub fn matches(&self, publication: &Publication) -> Vec<String> {
        let text = [
            Some(publication.title.as_str()),
            publication.authors.as_deref(),
            publication.venue.as_deref(),
            publication.snippet.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
        self.find(&text)
    }

    /// Keep matching publications, recording what matched.
    pub fn apply(&self, publications: Vec<Publication>) -> Vec<Publication> {
        publications
            .into_iter()
            .filter_map(|mut publication| {
                let found = self.matches(&publication);
                if found.is_empty() {
                    None
                } else {
                    publication.keywords_found = found;
                    Some(publication)
                }
            })
            .collect()
    }
}
