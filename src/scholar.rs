//! Scholar scraping client.
//!
//! Fetches Scholar HTML with a browser-like request profile and session
//! cookies, then parses result pages, author cards and author profile pages
//! with `scraper`.

use crate::cookies::CookieJar;
use crate::error::{AcademicError, OptionExt, Result};
use crate::models::{field, AuthorSummary, Platform, Profile, Publication};
use crate::source::{build_http_client, fetch_text, ResearchSource, SourceResults, BROWSER_USER_AGENT};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Results per search page
const PAGE_SIZE: usize = 10;

/// Publications per profile page
const PROFILE_PAGE_SIZE: usize = 100;

/// Client options
#[derive(Debug, Clone)]
pub struct ScholarOptions {
    /// Proxy URL (e.g., "http://127.0.0.1:7890")
    pub proxy: Option<String>,
    /// Custom base URL for mirror sites
    pub base_url: Option<String>,
    /// Session cookies sent with each request
    pub cookies: CookieJar,
    /// Random pause between page fetches
    pub polite_delay: bool,
}

impl Default for ScholarOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            base_url: None,
            cookies: CookieJar::default(),
            polite_delay: true,
        }
    }
}

/// Scholar profile with its publication list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScholarProfile {
    pub profile: Profile,
    pub publications: Vec<Publication>,
}

pub struct ScholarClient {
    client: reqwest::Client,
    base_url: String,
    cookies: CookieJar,
    polite_delay: bool,
}

impl ScholarClient {
    pub fn new(options: ScholarOptions) -> Result<Self> {
        let base_url = options
            .base_url
            .as_deref()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SCHOLAR_URL.to_string());
        Url::parse(&base_url)
            .map_err(|e| AcademicError::Config(format!("Invalid Scholar URL '{}': {}", base_url, e)))?;

        Ok(Self {
            client: build_http_client(BROWSER_USER_AGENT, options.proxy.as_deref())?,
            base_url,
            cookies: options.cookies,
            polite_delay: options.polite_delay,
        })
    }

    /// Publications matching `query`, fetched page by page up to `max_results`.
    pub async fn search_publications(&self, query: &str, max_results: usize) -> Result<Vec<Publication>> {
        info!(query, max_results, url = %self.base_url, "Starting Scholar publication search");

        let mut results = Vec::new();
        let mut start = 0;
        while results.len() < max_results {
            let url = build_search_url(&self.base_url, query, start)?;
            let html = self.fetch(&url).await?;
            let page = parse_result_items(&html)?;
            debug!(start, count = page.len(), "Parsed results page");

            let exhausted = page.len() < PAGE_SIZE;
            results.extend(page);
            if exhausted {
                break;
            }
            start += PAGE_SIZE;
        }

        results.truncate(max_results);
        info!(total = results.len(), "Scholar publication search complete");
        Ok(results)
    }

    /// Author cards matching `name`.
    pub async fn author_cards(&self, name: &str, max_results: usize) -> Result<Vec<AuthorSummary>> {
        info!(name, max_results, "Starting Scholar author search");

        let mut url = Url::parse(&format!("{}/citations", self.base_url))
            .map_err(|e| AcademicError::Config(format!("Invalid base URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("view_op", "search_authors")
            .append_pair("mauthors", name)
            .append_pair("hl", "en");

        let html = self.fetch(&url).await?;
        let mut authors = parse_author_cards(&html, &self.base_url)?;
        authors.truncate(max_results);
        info!(count = authors.len(), "Scholar author search complete");
        Ok(authors)
    }

    /// Profile page of `author_id` with up to `max_publications` works.
    pub async fn author_profile(&self, author_id: &str, max_publications: usize) -> Result<ScholarProfile> {
        info!(author_id, max_publications, "Loading Scholar profile");

        let mut profile: Option<Profile> = None;
        let mut publications = Vec::new();
        let mut cstart = 0;
        loop {
            let url = build_profile_url(&self.base_url, author_id, cstart)?;
            let html = self.fetch(&url).await?;
            if profile.is_none() {
                profile = Some(parse_profile_header(&html, author_id, &url)?);
            }

            let page = parse_profile_publications(&html, &self.base_url)?;
            let exhausted = page.len() < PROFILE_PAGE_SIZE;
            publications.extend(page);
            if exhausted || publications.len() >= max_publications {
                break;
            }
            cstart += PROFILE_PAGE_SIZE;
        }
        publications.truncate(max_publications);

        let mut profile = profile.ok_or_parse("Scholar profile page had no header")?;
        profile.total_publications = Some(publications.len() as u64);
        Ok(ScholarProfile { profile, publications })
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        if self.polite_delay {
            let delay = rand::random::<u64>() % 1500 + 500;
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut request = self
            .client
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache");
        match self.cookies.header() {
            Some(cookie) => request = request.header("Cookie", cookie),
            None => warn!("No Scholar cookies loaded; challenge pages are more likely"),
        }

        fetch_text(request, Platform::Scholar).await
    }

    fn into_results(scholar: ScholarProfile) -> SourceResults {
        let mut profile = scholar.profile;
        profile.publications = scholar.publications;
        SourceResults::from_profile(profile)
    }
}

#[async_trait]
impl ResearchSource for ScholarClient {
    fn platform(&self) -> Platform {
        Platform::Scholar
    }

    /// Resolves the best matching author card and loads that profile.
    async fn search_author(&self, name: &str, max_results: usize) -> Result<SourceResults> {
        let author = self
            .author_cards(name, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AcademicError::NotFound(format!("No Scholar profile for '{}'", name)))?;
        let scholar = self.author_profile(&author.author_id, max_results).await?;
        Ok(Self::into_results(scholar))
    }

    async fn search_topic(&self, topic: &str, max_results: usize) -> Result<SourceResults> {
        Ok(SourceResults {
            publications: self.search_publications(topic, max_results).await?,
            ..Default::default()
        })
    }

    async fn search_authors(&self, name: &str, max_results: usize) -> Result<Vec<AuthorSummary>> {
        self.author_cards(name, max_results).await
    }

    async fn profile(&self, reference: &str, max_publications: usize) -> Result<SourceResults> {
        match author_id_from_reference(reference) {
            Some(author_id) => {
                let scholar = self.author_profile(&author_id, max_publications).await?;
                Ok(Self::into_results(scholar))
            }
            None => self.search_author(reference, max_publications).await,
        }
    }
}

/// Scholar user id from a profile URL or a bare id.
pub fn author_id_from_reference(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.contains("user=") {
        let url = Url::parse(reference)
            .or_else(|_| Url::parse(DEFAULT_SCHOLAR_URL).and_then(|base| base.join(reference)))
            .ok()?;
        return url
            .query_pairs()
            .find(|(k, _)| k == "user")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty());
    }
    let looks_like_id = reference.len() == 12
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    looks_like_id.then(|| reference.to_string())
}

fn build_search_url(base_url: &str, query: &str, start: usize) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/scholar", base_url))
        .map_err(|e| AcademicError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("hl", "en") // English locale keeps "Cited by" parsable
        .append_pair("start", &start.to_string())
        .append_pair("as_sdt", "0,5");

    Ok(url)
}

fn build_profile_url(base_url: &str, author_id: &str, cstart: usize) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/citations", base_url))
        .map_err(|e| AcademicError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("user", author_id)
        .append_pair("hl", "en")
        .append_pair("cstart", &cstart.to_string())
        .append_pair("pagesize", &PROFILE_PAGE_SIZE.to_string())
        .append_pair("sortby", "pubdate");

    Ok(url)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AcademicError::Parse(e.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolute(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn count_in(text: &str) -> Option<u64> {
    field::as_count(&serde_json::Value::String(text.to_string()))
}

/// Parse a Scholar results page.
pub fn parse_result_items(html: &str) -> Result<Vec<Publication>> {
    let document = Html::parse_document(html);

    let item_selector = selector("div.gs_r.gs_or.gs_scl")?;
    let title_selector = selector("h3.gs_rt")?;
    let link_selector = selector("h3.gs_rt a")?;
    let meta_selector = selector("div.gs_a")?;
    let snippet_selector = selector("div.gs_rs")?;
    let cite_selector = selector("div.gs_fl a")?;

    let cite_regex =
        Regex::new(r"Cited by\s*(\d+)").map_err(|e| AcademicError::Parse(e.to_string()))?;

    let mut results = Vec::new();
    for item in document.select(&item_selector) {
        let mut publication = Publication {
            platform: Some(Platform::Scholar),
            ..Default::default()
        };

        if let Some(link) = item.select(&link_selector).next() {
            publication.title = text_of(link);
            publication.link = link.value().attr("href").map(str::to_string);
        } else if let Some(title) = item.select(&title_selector).next() {
            // citation-only entries carry a "[CITATION]" prefix
            publication.title = text_of(title)
                .trim_start_matches("[CITATION]")
                .trim_start_matches("[C]")
                .trim()
                .to_string();
        }

        // "Authors - Venue, Year - host"
        if let Some(meta) = item.select(&meta_selector).next() {
            let meta_text = text_of(meta);
            let mut parts = meta_text.split(" - ");
            publication.authors = parts.next().map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
            if let Some(venue_year) = parts.next() {
                publication.year = field::find_year(venue_year);
                let venue = venue_year
                    .trim()
                    .trim_end_matches(|c: char| c.is_ascii_digit())
                    .trim()
                    .trim_end_matches(',')
                    .trim();
                publication.venue = Some(venue.to_string()).filter(|v| !v.is_empty());
            }
        }

        if let Some(snippet) = item.select(&snippet_selector).next() {
            publication.snippet = Some(text_of(snippet)).filter(|s| !s.is_empty());
        }

        for link in item.select(&cite_selector) {
            let href = link.value().attr("href").unwrap_or("");
            if !href.contains("cites=") {
                continue;
            }
            let text = text_of(link);
            if let Some(count) = cite_regex.captures(&text).and_then(|c| c.get(1)) {
                publication.citations = count.as_str().parse().ok();
                break;
            }
        }

        if !publication.title.is_empty() {
            results.push(publication);
        }
    }

    Ok(results)
}

/// Parse the author cards of an author search page.
pub fn parse_author_cards(html: &str, base_url: &str) -> Result<Vec<AuthorSummary>> {
    let document = Html::parse_document(html);

    let card_selector = selector("div.gs_ai")?;
    let name_selector = selector(".gs_ai_name a")?;
    let affiliation_selector = selector(".gs_ai_aff")?;
    let email_selector = selector(".gs_ai_eml")?;
    let cited_selector = selector(".gs_ai_cby")?;
    let interest_selector = selector("a.gs_ai_one_int")?;

    let mut authors = Vec::new();
    for card in document.select(&card_selector) {
        let Some(name_link) = card.select(&name_selector).next() else {
            continue;
        };
        let href = name_link.value().attr("href").unwrap_or("");
        let Some(author_id) = author_id_from_reference(href) else {
            continue;
        };

        authors.push(AuthorSummary {
            profile_url: absolute(base_url, &format!("/citations?user={}&hl=en", author_id)),
            author_id,
            name: text_of(name_link),
            institution: card
                .select(&affiliation_selector)
                .next()
                .map(text_of)
                .filter(|s| !s.is_empty()),
            email_domain: card
                .select(&email_selector)
                .next()
                .map(text_of)
                .map(|s| s.trim_start_matches("Verified email at").trim().to_string())
                .filter(|s| !s.is_empty()),
            total_citations: card
                .select(&cited_selector)
                .next()
                .and_then(|e| count_in(&text_of(e))),
            research_areas: card.select(&interest_selector).map(text_of).collect(),
            h_index: None,
            i10_index: None,
        });
    }
    Ok(authors)
}

/// Parse name, affiliation, interests and the metrics table of a profile page.
pub fn parse_profile_header(html: &str, author_id: &str, url: &Url) -> Result<Profile> {
    let document = Html::parse_document(html);

    let name_selector = selector("#gsc_prf_in")?;
    let affiliation_selector = selector(".gsc_prf_il")?;
    let interest_selector = selector("#gsc_prf_int a")?;
    let row_selector = selector("#gsc_rsb_st tr")?;
    let label_selector = selector("td.gsc_rsb_sc1")?;
    let value_selector = selector("td.gsc_rsb_std")?;

    let name = document
        .select(&name_selector)
        .next()
        .map(text_of)
        .filter(|n| !n.is_empty())
        .ok_or_parse("Scholar profile has no name")?;

    let mut profile = Profile {
        name,
        institution: document
            .select(&affiliation_selector)
            .next()
            .map(text_of)
            .filter(|s| !s.is_empty()),
        research_areas: document.select(&interest_selector).map(text_of).collect(),
        author_id: Some(author_id.to_string()),
        url: Some(format!(
            "{}://{}/citations?user={}",
            url.scheme(),
            url.host_str().unwrap_or("scholar.google.com"),
            author_id
        )),
        platform: Some(Platform::Scholar),
        ..Default::default()
    };

    // rows: Citations, h-index, i10-index; first value column is "All"
    for row in document.select(&row_selector) {
        let Some(label) = row.select(&label_selector).next().map(|e| text_of(e).to_lowercase()) else {
            continue;
        };
        let value = row.select(&value_selector).next().and_then(|e| count_in(&text_of(e)));
        if label.contains("citations") {
            profile.total_citations = value;
        } else if label.contains("h-index") {
            profile.h_index = value;
        } else if label.contains("i10-index") {
            profile.i10_index = value;
        }
    }

    Ok(profile)
}

/// Parse the publication table of a profile page.
pub fn parse_profile_publications(html: &str, base_url: &str) -> Result<Vec<Publication>> {
    let document = Html::parse_document(html);

    let row_selector = selector("tr.gsc_a_tr")?;
    let title_selector = selector("a.gsc_a_at")?;
    let gray_selector = selector("div.gs_gray")?;
    let citations_selector = selector("td.gsc_a_c")?;
    let year_selector = selector(".gsc_a_h")?;

    let mut publications = Vec::new();
    for row in document.select(&row_selector) {
        let Some(title_link) = row.select(&title_selector).next() else {
            continue;
        };
        let title = text_of(title_link);
        if title.is_empty() {
            continue;
        }

        let gray: Vec<String> = row.select(&gray_selector).map(text_of).collect();
        let (authors, venue) = match gray.as_slice() {
            [authors, venue, ..] => (Some(authors.clone()), Some(venue.clone())),
            [combined] => match combined.split_once(" - ") {
                Some((authors, venue)) => (Some(authors.trim().to_string()), Some(venue.trim().to_string())),
                None => (Some(combined.clone()), None),
            },
            [] => (None, None),
        };
        // venue lines end with ", <year>"
        let venue = venue
            .map(|v| {
                v.trim_end_matches(|c: char| c.is_ascii_digit())
                    .trim()
                    .trim_end_matches(',')
                    .trim()
                    .to_string()
            })
            .filter(|v| !v.is_empty());

        publications.push(Publication {
            title,
            authors: authors.filter(|a| !a.is_empty()),
            year: row
                .select(&year_selector)
                .next()
                .and_then(|e| text_of(e).trim().parse().ok()),
            citations: Some(
                row.select(&citations_selector)
                    .next()
                    .and_then(|e| count_in(&text_of(e)))
                    .unwrap_or(0),
            ),
            venue,
            link: title_link
                .value()
                .attr("href")
                .map(|href| absolute(base_url, href)),
            platform: Some(Platform::Scholar),
            ..Default::default()
        });
    }
    Ok(publications)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_HTML: &str = r#"
        <div class="gs_r gs_or gs_scl">
          <div class="gs_ri">
            <h3 class="gs_rt"><a href="https://example.org/paper">Physical activity in older adults</a></h3>
            <div class="gs_a">A Silva, B Souza - Revista de Saúde, 2019 - example.org</div>
            <div class="gs_rs">We study physical activity among older adults.</div>
            <div class="gs_fl gs_flb"><a href="/scholar?cites=123">Cited by 42</a></div>
          </div>
        </div>
        <div class="gs_r gs_or gs_scl">
          <div class="gs_ri"><h3 class="gs_rt">[CITATION] Untitled note</h3></div>
        </div>"#;

    const PROFILE_HTML: &str = r##"
        <div id="gsc_prf_in">Maria Silva</div>
        <div class="gsc_prf_il">Universidade de Brasília</div>
        <div id="gsc_prf_int"><a href="#">Gerontology</a><a href="#">Aging</a></div>
        <table id="gsc_rsb_st">
          <thead><tr><th></th><th>All</th><th>Since 2019</th></tr></thead>
          <tbody>
            <tr><td class="gsc_rsb_sc1"><a>Citations</a></td><td class="gsc_rsb_std">1,234</td><td class="gsc_rsb_std">800</td></tr>
            <tr><td class="gsc_rsb_sc1"><a>h-index</a></td><td class="gsc_rsb_std">18</td><td class="gsc_rsb_std">12</td></tr>
            <tr><td class="gsc_rsb_sc1"><a>i10-index</a></td><td class="gsc_rsb_std">25</td><td class="gsc_rsb_std">15</td></tr>
          </tbody>
        </table>
        <table><tbody>
          <tr class="gsc_a_tr">
            <td class="gsc_a_t"><a href="/citations?view_op=view_citation&amp;citation_for_view=abc" class="gsc_a_at">Frailty in the elderly</a>
              <div class="gs_gray">M Silva, J Costa</div><div class="gs_gray">Revista Brasileira de Geriatria 20 (3), 2017</div></td>
            <td class="gsc_a_c"><a class="gsc_a_ac gs_ibl">57</a></td>
            <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">2017</span></td>
          </tr>
          <tr class="gsc_a_tr">
            <td class="gsc_a_t"><a href="/x" class="gsc_a_at">Quality of life</a><div class="gs_gray">M Silva - Cadernos, 2015</div></td>
            <td class="gsc_a_c"><a class="gsc_a_ac gs_ibl"></a></td>
            <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">2015</span></td>
          </tr>
        </tbody></table>"##;

    #[test]
    fn test_build_search_url() -> Result<()> {
        let url = build_search_url(DEFAULT_SCHOLAR_URL, "healthy aging", 10)?;
        assert!(url.as_str().contains("q=healthy+aging"));
        assert!(url.as_str().contains("start=10"));
        Ok(())
    }

    #[test]
    fn test_parse_empty_html() -> Result<()> {
        assert!(parse_result_items("<html><body></body></html>")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_result_items() -> Result<()> {
        let results = parse_result_items(RESULTS_HTML)?;
        assert_eq!(results.len(), 2);
        let first = &results[0];
        assert_eq!(first.title, "Physical activity in older adults");
        assert_eq!(first.authors.as_deref(), Some("A Silva, B Souza"));
        assert_eq!(first.venue.as_deref(), Some("Revista de Saúde"));
        assert_eq!(first.year, Some(2019));
        assert_eq!(first.citations, Some(42));
        assert_eq!(first.link.as_deref(), Some("https://example.org/paper"));
        assert_eq!(results[1].title, "Untitled note");
        Ok(())
    }

    #[test]
    fn test_parse_author_cards() -> Result<()> {
        let html = r##"
            <div class="gsc_1usr"><div class="gs_ai gs_scl">
              <div class="gs_ai_t">
                <h3 class="gs_ai_name"><a href="/citations?hl=en&amp;user=AbCdEfGhIjKl">Maria Silva</a></h3>
                <div class="gs_ai_aff">Universidade de Brasília</div>
                <div class="gs_ai_eml">Verified email at unb.br</div>
                <div class="gs_ai_cby">Cited by 1234</div>
                <div class="gs_ai_int"><a class="gs_ai_one_int" href="#">Gerontology</a></div>
              </div>
            </div></div>"##;
        let authors = parse_author_cards(html, DEFAULT_SCHOLAR_URL)?;
        assert_eq!(authors.len(), 1);
        let author = &authors[0];
        assert_eq!(author.author_id, "AbCdEfGhIjKl");
        assert_eq!(author.email_domain.as_deref(), Some("unb.br"));
        assert_eq!(author.total_citations, Some(1234));
        assert_eq!(author.research_areas, vec!["Gerontology".to_string()]);
        assert_eq!(
            author.profile_url,
            "https://scholar.google.com/citations?user=AbCdEfGhIjKl&hl=en"
        );
        Ok(())
    }

    #[test]
    fn test_parse_profile_page() -> Result<()> {
        let url = build_profile_url(DEFAULT_SCHOLAR_URL, "AbCdEfGhIjKl", 0)?;
        let profile = parse_profile_header(PROFILE_HTML, "AbCdEfGhIjKl", &url)?;
        assert_eq!(profile.name, "Maria Silva");
        assert_eq!(profile.institution.as_deref(), Some("Universidade de Brasília"));
        assert_eq!(profile.total_citations, Some(1234));
        assert_eq!(profile.h_index, Some(18));
        assert_eq!(profile.i10_index, Some(25));
        assert_eq!(profile.research_areas.len(), 2);

        let publications = parse_profile_publications(PROFILE_HTML, DEFAULT_SCHOLAR_URL)?;
        assert_eq!(publications.len(), 2);
        assert_eq!(publications[0].authors.as_deref(), Some("M Silva, J Costa"));
        assert_eq!(publications[0].venue.as_deref(), Some("Revista Brasileira de Geriatria 20 (3)"));
        assert_eq!(publications[0].citations, Some(57));
        assert_eq!(publications[0].year, Some(2017));
        assert!(publications[0]
            .link
            .as_deref()
            .is_some_and(|l| l.starts_with("https://scholar.google.com/citations")));
        assert_eq!(publications[1].authors.as_deref(), Some("M Silva"));
        assert_eq!(publications[1].venue.as_deref(), Some("Cadernos"));
        assert_eq!(publications[1].citations, Some(0));
        Ok(())
    }

    #[test]
    fn test_profile_without_name_is_parse_error() -> Result<()> {
        let url = build_profile_url(DEFAULT_SCHOLAR_URL, "AbCdEfGhIjKl", 0)?;
        assert!(parse_profile_header("<html></html>", "AbCdEfGhIjKl", &url).is_err());
        Ok(())
    }

    #[test]
    fn test_author_id_from_reference() {
        assert_eq!(
            author_id_from_reference("https://scholar.google.com/citations?user=AbCdEfGhIjKl&hl=en").as_deref(),
            Some("AbCdEfGhIjKl")
        );
        assert_eq!(author_id_from_reference("AbCdEfGhIjKl").as_deref(), Some("AbCdEfGhIjKl"));
        assert_eq!(author_id_from_reference("Maria Silva"), None);
    }
}
