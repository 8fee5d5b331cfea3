//! Response normalizer.
//!
//! Search responses carry their records under many optional, overlapping
//! shapes: top-level lists, lists nested under `data`, or a
//! `results_by_platform` map whose entries may nest once more under their
//! own `data`. [`flatten`] walks a fixed, ordered table of those shapes and
//! emits one platform-tagged [`Item`] per record found.
//!
//! Every shape fires independently, so a record present under two shapes is
//! emitted twice. Callers that want one entry per record can opt into
//! [`dedup_by_identity`].

use crate::error::AcademicError;
use crate::models::{field, Platform, Profile, Publication};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

/// What a flattened record turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Publication(Publication),
    Profile(Profile),
    /// Matched a known shape but neither classification rule
    Unclassified(Map<String, Value>),
}

/// One record of the unified list.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Canonical platform assigned by the shape that discovered the record
    pub platform: Platform,
    pub kind: ItemKind,
}

impl Item {
    /// Link shown for this item, if any.
    pub fn link(&self) -> Option<String> {
        match &self.kind {
            ItemKind::Publication(p) => p.display_link().map(str::to_string),
            ItemKind::Profile(p) => p.display_link(self.platform),
            ItemKind::Unclassified(_) => None,
        }
    }

    /// Title of a publication or name of a profile.
    pub fn heading(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Publication(p) => Some(&p.title),
            ItemKind::Profile(p) => Some(&p.name),
            ItemKind::Unclassified(_) => None,
        }
    }

    pub fn is_renderable(&self) -> bool {
        !matches!(self.kind, ItemKind::Unclassified(_))
    }

    fn kind_tag(&self) -> &'static str {
        match self.kind {
            ItemKind::Publication(_) => "publication",
            ItemKind::Profile(_) => "profile",
            ItemKind::Unclassified(_) => "unclassified",
        }
    }
}

/// How a shape assigns the platform tag.
#[derive(Debug, Clone, Copy)]
enum Tagging {
    /// Use the response's own `platform` field, else this default
    Response(Platform),
    /// Always this platform, whatever the record says
    Fixed(Platform),
}

#[derive(Debug)]
struct Shape {
    path: &'static [&'static str],
    tagging: Tagging,
}

const fn shape(path: &'static [&'static str], tagging: Tagging) -> Shape {
    Shape { path, tagging }
}

/// Known shapes in discovery order.
const SHAPES: &[Shape] = &[
    shape(&["publications"], Tagging::Response(Platform::Scholar)),
    shape(&["profiles"], Tagging::Response(Platform::Lattes)),
    shape(&["data", "profiles"], Tagging::Response(Platform::Lattes)),
    shape(&["data", "publications"], Tagging::Response(Platform::Scholar)),
    shape(
        &["results_by_platform", "scholar", "publications"],
        Tagging::Fixed(Platform::Scholar),
    ),
    shape(
        &["results_by_platform", "scholar", "data", "publications"],
        Tagging::Fixed(Platform::Scholar),
    ),
    shape(
        &["results_by_platform", "scholar", "profiles"],
        Tagging::Fixed(Platform::Scholar),
    ),
    shape(
        &["results_by_platform", "lattes", "lattes_profiles"],
        Tagging::Fixed(Platform::Lattes),
    ),
    shape(
        &["results_by_platform", "lattes", "data", "lattes_profiles"],
        Tagging::Fixed(Platform::Lattes),
    ),
    shape(
        &["results_by_platform", "lattes", "profiles"],
        Tagging::Fixed(Platform::Lattes),
    ),
    shape(
        &["results_by_platform", "orcid", "orcid_profiles"],
        Tagging::Fixed(Platform::Orcid),
    ),
    shape(
        &["results_by_platform", "orcid", "data", "orcid_profiles"],
        Tagging::Fixed(Platform::Orcid),
    ),
    shape(
        &["results_by_platform", "orcid", "profiles"],
        Tagging::Fixed(Platform::Orcid),
    ),
];

/// Array found at `path`, if every step is an object and the leaf an array.
pub(crate) fn array_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    path.iter()
        .try_fold(root, |node, key| node.as_object()?.get(*key))?
        .as_array()
}

/// Flatten a raw search response into one platform-tagged list.
///
/// Never fails: absent or malformed shapes contribute nothing, and
/// non-object entries inside a list are skipped.
pub fn flatten(response: &Value) -> Vec<Item> {
    let response_platform = response
        .get("platform")
        .and_then(Value::as_str)
        .and_then(Platform::from_tag);

    let mut items = Vec::new();
    for shape in SHAPES {
        let Some(records) = array_at(response, shape.path) else {
            continue;
        };
        let platform = match shape.tagging {
            Tagging::Response(default) => response_platform.unwrap_or(default),
            Tagging::Fixed(platform) => platform,
        };
        for record in records.iter().filter_map(Value::as_object) {
            items.push(Item {
                platform,
                kind: classify(record, platform),
            });
        }
    }

    let unclassified = items.iter().filter(|i| !i.is_renderable()).count();
    if unclassified > 0 {
        debug!(unclassified, total = items.len(), "Records matched neither publication nor profile");
    }
    items
}

/// Decide whether a record is a publication or a profile.
///
/// An explicit `kind` field wins; otherwise field presence decides.
pub fn classify(record: &Map<String, Value>, platform: Platform) -> ItemKind {
    let has = |key: &str| field::text(record, &[key]).is_some();

    let explicit = record.get("kind").and_then(Value::as_str);
    let as_publication = match explicit {
        Some("publication") => true,
        Some("profile") => false,
        _ => has("title") && (!has("name") || has("authors")),
    };
    let as_profile = match explicit {
        Some("profile") => true,
        Some("publication") => false,
        _ => {
            has("name")
                && (has("lattes_id")
                    || has("orcid_id")
                    || has("institution")
                    || has("current_institution"))
        }
    };

    if as_publication {
        if let Some(mut publication) = Publication::from_json(record) {
            publication.platform = Some(platform);
            return ItemKind::Publication(publication);
        }
    } else if as_profile {
        if let Some(mut profile) = Profile::from_json(record) {
            profile.platform = Some(platform);
            return ItemKind::Profile(profile);
        }
    }
    ItemKind::Unclassified(record.clone())
}

/// Per-platform item counts for tab badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCounts {
    pub scholar: usize,
    pub lattes: usize,
    pub orcid: usize,
}

impl PlatformCounts {
    pub fn get(&self, platform: Platform) -> usize {
        match platform {
            Platform::Scholar => self.scholar,
            Platform::Lattes => self.lattes,
            Platform::Orcid => self.orcid,
        }
    }

    pub fn total(&self) -> usize {
        self.scholar + self.lattes + self.orcid
    }
}

pub fn count_by_platform(items: &[Item]) -> PlatformCounts {
    items
        .iter()
        .fold(PlatformCounts::default(), |mut counts, item| {
            match item.platform {
                Platform::Scholar => counts.scholar += 1,
                Platform::Lattes => counts.lattes += 1,
                Platform::Orcid => counts.orcid += 1,
            }
            counts
        })
}

/// Active result tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    All,
    Platform(Platform),
}

impl Tab {
    pub fn accepts(&self, item: &Item) -> bool {
        match self {
            Tab::All => true,
            Tab::Platform(platform) => item.platform == *platform,
        }
    }
}

impl FromStr for Tab {
    type Err = AcademicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Tab::All)
        } else {
            s.parse().map(Tab::Platform)
        }
    }
}

pub fn filter_tab(items: &[Item], tab: Tab) -> Vec<&Item> {
    items.iter().filter(|item| tab.accepts(item)).collect()
}

/// Drop repeated records, keeping the first occurrence.
///
/// Identity is platform, kind and case-folded title or name. Unclassified
/// records are always kept.
pub fn dedup_by_identity(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match item.heading() {
            Some(heading) => seen.insert((
                item.platform,
                item.kind_tag(),
                heading.trim().to_lowercase(),
            )),
            None => true,
        })
        .collect()
}
