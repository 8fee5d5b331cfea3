//! Lattes researcher registry client.
//!
//! Uses the registry's public text search to find curricula and scrapes the
//! curriculum page (`visualizacv.do`) for identity, areas, education and
//! published articles.

use crate::error::{AcademicError, OptionExt, Result};
use crate::models::{Platform, Profile, Publication};
use crate::source::{build_http_client, fetch_text, ResearchSource, SourceResults, BROWSER_USER_AGENT};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

/// Registry search base URL
pub const DEFAULT_LATTES_URL: &str = "http://buscatextual.cnpq.br/buscatextual";

/// Curricula fetched concurrently after a search
const CV_CONCURRENCY: usize = 3;

/// Whether a text search looks at names or at curriculum subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchMode {
    Name,
    Subject,
}

/// One hit of the registry text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LattesHit {
    pub id: String,
    pub name: String,
}

pub struct LattesClient {
    client: reqwest::Client,
    base_url: String,
}

impl LattesClient {
    pub fn new(proxy: Option<&str>, base_url: Option<&str>) -> Result<Self> {
        let base_url = base_url
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_LATTES_URL.to_string());
        Url::parse(&base_url)
            .map_err(|e| AcademicError::Config(format!("Invalid Lattes URL '{}': {}", base_url, e)))?;

        Ok(Self {
            client: build_http_client(BROWSER_USER_AGENT, proxy)?,
            base_url,
        })
    }

    async fn search(&self, text: &str, mode: SearchMode, max_results: usize) -> Result<Vec<LattesHit>> {
        let mut url = Url::parse(&format!("{}/busca.do", self.base_url))
            .map_err(|e| AcademicError::Config(format!("Invalid base URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("metodo", "buscar")
            .append_pair("acao", "")
            .append_pair("textoBusca", text)
            .append_pair("buscarDoutores", "true")
            .append_pair("buscarDemais", "true")
            .append_pair("buscaAvancada", "0")
            .append_pair("filtros.buscaNome", if mode == SearchMode::Name { "true" } else { "false" })
            .append_pair("registros", &format!("0;{}", max_results.max(1)));

        info!(text, ?mode, "Starting Lattes search");
        let html = self.get(url.as_str()).await?;
        let mut hits = parse_search_results(&html)?;
        hits.truncate(max_results);
        info!(count = hits.len(), "Lattes search complete");
        Ok(hits)
    }

    /// Fetch and parse the curriculum `id`.
    pub async fn curriculum(&self, id: &str) -> Result<Profile> {
        let url = format!("{}/visualizacv.do?id={}", self.base_url, urlencoding::encode(id));
        debug!(id, "Fetching Lattes curriculum");
        let html = self.get(&url).await?;
        parse_curriculum(&html, id)
    }

    /// Curricula for every hit, skipping the ones that fail to load.
    ///
    /// A challenge aborts the whole batch since every later request would
    /// hit the same page.
    async fn curricula(&self, hits: Vec<LattesHit>) -> Result<Vec<Profile>> {
        let fetched: Vec<(LattesHit, Result<Profile>)> = stream::iter(hits)
            .map(|hit| async move {
                let result = self.curriculum(&hit.id).await;
                (hit, result)
            })
            .buffered(CV_CONCURRENCY)
            .collect()
            .await;

        let mut profiles = Vec::with_capacity(fetched.len());
        for (hit, result) in fetched {
            match result {
                Ok(profile) => profiles.push(profile),
                Err(e) if e.is_challenge() => return Err(e),
                Err(e) => warn!(id = %hit.id, name = %hit.name, error = %e, "Skipping curriculum"),
            }
        }
        Ok(profiles)
    }

    async fn search_profiles(&self, text: &str, mode: SearchMode, max_results: usize) -> Result<SourceResults> {
        let hits = self.search(text, mode, max_results).await?;
        let profiles = self.curricula(hits).await?;
        let researcher_info = match profiles.as_slice() {
            [only] => Some(only.into()),
            _ => None,
        };
        Ok(SourceResults {
            publications: Vec::new(),
            profiles,
            researcher_info,
        })
    }

    async fn get(&self, url: &str) -> Result<String> {
        let request = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "pt-BR,pt;q=0.9,en-US;q=0.8")
            .header("Referer", "http://buscatextual.cnpq.br/");
        fetch_text(request, Platform::Lattes).await
    }
}

#[async_trait]
impl ResearchSource for LattesClient {
    fn platform(&self) -> Platform {
        Platform::Lattes
    }

    async fn search_author(&self, name: &str, max_results: usize) -> Result<SourceResults> {
        self.search_profiles(name, SearchMode::Name, max_results).await
    }

    async fn search_topic(&self, topic: &str, max_results: usize) -> Result<SourceResults> {
        self.search_profiles(topic, SearchMode::Subject, max_results).await
    }

    async fn profile(&self, reference: &str, max_publications: usize) -> Result<SourceResults> {
        let mut profile = match curriculum_id_from_reference(reference) {
            Some(id) => self.curriculum(&id).await?,
            None => {
                let hit = self
                    .search(reference, SearchMode::Name, 1)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| AcademicError::NotFound(format!("No Lattes curriculum for '{}'", reference)))?;
                self.curriculum(&hit.id).await?
            }
        };
        profile.publications.truncate(max_publications);
        Ok(SourceResults::from_profile(profile))
    }
}

static CURRICULUM_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"lattes\.cnpq\.br/(\d{16})",
        r"[?&]id=([A-Za-z0-9]+)",
        r"^(\d{16}|K\d{7}[A-Z0-9]{2})$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Curriculum id from a `lattes.cnpq.br/<id>` URL, a `visualizacv.do?id=`
/// URL, or a bare id.
pub fn curriculum_id_from_reference(reference: &str) -> Option<String> {
    let reference = reference.trim();
    CURRICULUM_ID_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(reference)?
            .get(1)
            .map(|m| m.as_str().to_string())
    })
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

/// Parse the hit list of a registry search page.
pub fn parse_search_results(html: &str) -> Result<Vec<LattesHit>> {
    let document = Html::parse_document(html);
    let link_selector = selector("a[href]")?;
    let detail_regex = Regex::new(r"abreDetalhe\('([A-Za-z0-9]+)'")
        .map_err(|e| AcademicError::Parse(e.to_string()))?;
    let cv_regex = Regex::new(r"visualizacv\.do\?.*?id=([A-Za-z0-9]+)")
        .map_err(|e| AcademicError::Parse(e.to_string()))?;

    let mut hits: Vec<LattesHit> = Vec::new();
    for link in document.select(&link_selector) {
        let href = link.value().attr("href").unwrap_or("");
        let Some(id) = detail_regex
            .captures(href)
            .or_else(|| cv_regex.captures(href))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };
        if hits.iter().any(|h| h.id == id) {
            continue;
        }
        hits.push(LattesHit {
            id,
            name: text_of(link),
        });
    }
    Ok(hits)
}

/// Entries of the curriculum section introduced by `<a name="{anchor}">`.
fn section_entries(document: &Html, anchor: &str) -> Result<Vec<String>> {
    let anchor_selector = selector(&format!("a[name='{}']", anchor))?;
    let entry_selector = selector("div.layout-cell-9 div.layout-cell-pad-5")?;

    let Some(wrapper) = document
        .select(&anchor_selector)
        .next()
        .and_then(|a| a.parent())
        .and_then(ElementRef::wrap)
    else {
        return Ok(Vec::new());
    };
    Ok(wrapper
        .select(&entry_selector)
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect())
}

/// Text of an article entry without the hidden sort-key spans.
fn reference_text(entry: ElementRef<'_>) -> String {
    let mut text = String::new();
    for child in entry.children() {
        if let Some(t) = child.value().as_text() {
            text.push_str(t);
        } else if let Some(element) = ElementRef::wrap(child) {
            let name = element.value().name();
            if name != "span" && name != "sup" {
                text.push_str(&element.text().collect::<String>());
            }
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a registry article reference
/// (`AUTHORS . Title. Venue, v. 1, p. 2, 2019.`) into authors, title and venue.
pub fn split_reference(reference: &str) -> (Option<String>, String, Option<String>) {
    let (authors, rest) = match reference.split_once(" . ") {
        Some((authors, rest)) => (Some(authors.trim().to_string()), rest.trim()),
        None => (None, reference.trim()),
    };
    let (title, venue) = match rest.split_once(". ") {
        Some((title, venue)) => {
            let venue = venue.split(", v.").next().unwrap_or(venue);
            let venue = venue.split(", p.").next().unwrap_or(venue);
            let venue = venue.trim().trim_end_matches('.').trim();
            (title.trim().to_string(), Some(venue.to_string()).filter(|v| !v.is_empty()))
        }
        None => (rest.trim_end_matches('.').trim().to_string(), None),
    };
    (authors, title, venue)
}

/// Parse a curriculum page.
pub fn parse_curriculum(html: &str, id: &str) -> Result<Profile> {
    let document = Html::parse_document(html);

    let name_selector = selector("h2.nome, div.nome, .infpessoa h2")?;
    let info_selector = selector("ul.informacoes-autor li")?;
    let summary_selector = selector("p.resumo")?;
    let article_selector = selector("div.artigo-completo")?;
    let article_text_selector = selector("div.layout-cell-pad-5")?;
    let year_selector = selector("span[data-tipo-ordenacao='ano']")?;
    let doi_selector = selector("a.icone-doi")?;

    let name = document
        .select(&name_selector)
        .next()
        .map(text_of)
        .filter(|n| !n.is_empty())
        .ok_or_parse("Lattes curriculum has no name")?;

    let id_regex = Regex::new(r"lattes\.cnpq\.br/(\d{16})").map_err(|e| AcademicError::Parse(e.to_string()))?;
    let update_regex =
        Regex::new(r"(?i)atualiza\S*[^0-9]{0,40}(\d{2}/\d{2}/\d{4})").map_err(|e| AcademicError::Parse(e.to_string()))?;

    let info: Vec<String> = document.select(&info_selector).map(text_of).collect();
    let lattes_id = info
        .iter()
        .find_map(|line| id_regex.captures(line).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| id.to_string());
    let last_update = info
        .iter()
        .find_map(|line| update_regex.captures(line).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string());

    let institution = section_entries(&document, "Endereco")?
        .into_iter()
        .next()
        .and_then(|address| address.split('.').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());

    let mut publications = Vec::new();
    for article in document.select(&article_selector) {
        let Some(entry) = article.select(&article_text_selector).last() else {
            continue;
        };
        let (authors, title, venue) = split_reference(&reference_text(entry));
        if title.is_empty() {
            continue;
        }
        publications.push(Publication {
            title,
            authors,
            venue,
            year: article
                .select(&year_selector)
                .next()
                .and_then(|e| text_of(e).parse().ok()),
            doi: article
                .select(&doi_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| {
                    href.trim_start_matches("http://dx.doi.org/")
                        .trim_start_matches("https://doi.org/")
                        .to_string()
                }),
            platform: Some(Platform::Lattes),
            ..Default::default()
        });
    }
    debug!(id, articles = publications.len(), "Parsed Lattes curriculum");

    Ok(Profile {
        name,
        institution,
        research_areas: section_entries(&document, "AreasAtuacao")?,
        summary: document
            .select(&summary_selector)
            .next()
            .map(text_of)
            .filter(|s| !s.is_empty()),
        education: section_entries(&document, "FormacaoAcademicaTitulacao")?,
        lattes_url: Some(format!("http://lattes.cnpq.br/{}", lattes_id)),
        lattes_id: Some(lattes_id),
        total_publications: Some(publications.len() as u64),
        publications,
        last_update,
        platform: Some(Platform::Lattes),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CV_HTML: &str = r#"
        <div class="infpessoa">
          <h2 class="nome">Maria da Silva</h2>
          <ul class="informacoes-autor">
            <li>Endereço para acessar este CV: http://lattes.cnpq.br/1234567890123456</li>
            <li>Última atualização do currículo em 10/03/2024</li>
          </ul>
        </div>
        <p class="resumo">Possui doutorado em Ciências da Saúde.</p>
        <div class="title-wrapper"><a name="Endereco"></a><h1>Endereço</h1>
          <div class="layout-cell layout-cell-12 data-cell">
            <div class="layout-cell layout-cell-3"><div class="layout-cell-pad-5 text-align-right"><b>Endereço Profissional</b></div></div>
            <div class="layout-cell layout-cell-9"><div class="layout-cell-pad-5">Universidade de Brasília, Faculdade de Ceilândia. Centro Metropolitano</div></div>
          </div>
        </div>
        <div class="title-wrapper"><a name="AreasAtuacao"></a><h1>Áreas de atuação</h1>
          <div class="layout-cell layout-cell-3"><div class="layout-cell-pad-5 text-align-right"><b>1.</b></div></div>
          <div class="layout-cell layout-cell-9"><div class="layout-cell-pad-5">Grande área: Ciências da Saúde / Área: Saúde Coletiva.</div></div>
          <div class="layout-cell layout-cell-3"><div class="layout-cell-pad-5 text-align-right"><b>2.</b></div></div>
          <div class="layout-cell layout-cell-9"><div class="layout-cell-pad-5">Grande área: Ciências da Saúde / Área: Enfermagem.</div></div>
        </div>
        <div class="title-wrapper"><a name="FormacaoAcademicaTitulacao"></a><h1>Formação acadêmica/titulação</h1>
          <div class="layout-cell layout-cell-9"><div class="layout-cell-pad-5">Doutorado em Ciências da Saúde. Universidade de Brasília, UNB, Brasil.</div></div>
        </div>
        <div id="artigos-completos">
          <div class="artigo-completo">
            <div class="layout-cell layout-cell-1"><div class="layout-cell-pad-5 text-align-right"><b>1.</b></div></div>
            <div class="layout-cell layout-cell-11"><div class="layout-cell-pad-5">
              <span class="informacao-artigo" data-tipo-ordenacao="ano">2019</span>
              <span class="informacao-artigo" data-tipo-ordenacao="autor">SILVA</span>
              <a class="icone-producao icone-doi" href="http://dx.doi.org/10.1590/1981-22562019022.180123"></a>
              SILVA, M. ; COSTA, J. . Fragilidade em idosos. Revista Brasileira de Geriatria e Gerontologia, v. 22, p. 1-10, 2019.
            </div></div>
          </div>
        </div>"#;

    #[test]
    fn test_parse_curriculum() -> Result<()> {
        let profile = parse_curriculum(CV_HTML, "K1234567A8")?;
        assert_eq!(profile.name, "Maria da Silva");
        assert_eq!(profile.lattes_id.as_deref(), Some("1234567890123456"));
        assert_eq!(profile.lattes_url.as_deref(), Some("http://lattes.cnpq.br/1234567890123456"));
        assert_eq!(profile.last_update.as_deref(), Some("10/03/2024"));
        assert_eq!(profile.institution.as_deref(), Some("Universidade de Brasília, Faculdade de Ceilândia"));
        assert_eq!(profile.research_areas.len(), 2);
        assert_eq!(profile.education.len(), 1);
        assert_eq!(profile.summary.as_deref(), Some("Possui doutorado em Ciências da Saúde."));

        assert_eq!(profile.publications.len(), 1);
        let article = &profile.publications[0];
        assert_eq!(article.title, "Fragilidade em idosos");
        assert_eq!(article.authors.as_deref(), Some("SILVA, M. ; COSTA, J."));
        assert_eq!(article.venue.as_deref(), Some("Revista Brasileira de Geriatria e Gerontologia"));
        assert_eq!(article.year, Some(2019));
        assert_eq!(article.doi.as_deref(), Some("10.1590/1981-22562019022.180123"));
        assert_eq!(profile.total_publications, Some(1));
        Ok(())
    }

    #[test]
    fn test_curriculum_without_name_is_parse_error() {
        assert!(parse_curriculum("<html><body></body></html>", "1").is_err());
    }

    #[test]
    fn test_parse_search_results() -> Result<()> {
        let html = r#"
            <div class="resultado"><ol>
              <li><a href="javascript:abreDetalhe('K4787997A6','Maria_da_Silva',12345,)">Maria da Silva</a></li>
              <li><a href="visualizacv.do?metodo=apresentar&amp;id=K1112223B4">João Souza</a></li>
              <li><a href="javascript:abreDetalhe('K4787997A6','Maria_da_Silva',12345,)">Maria da Silva</a></li>
              <li><a href="/outra">Outro</a></li>
            </ol></div>"#;
        let hits = parse_search_results(html)?;
        assert_eq!(hits, vec![
            LattesHit { id: "K4787997A6".into(), name: "Maria da Silva".into() },
            LattesHit { id: "K1112223B4".into(), name: "João Souza".into() },
        ]);
        Ok(())
    }

    #[test]
    fn test_split_reference_without_authors() {
        let (authors, title, venue) = split_reference("Título simples.");
        assert_eq!(authors, None);
        assert_eq!(title, "Título simples");
        assert_eq!(venue, None);
    }

    #[test]
    fn test_curriculum_id_from_reference() {
        assert_eq!(
            curriculum_id_from_reference("http://lattes.cnpq.br/1234567890123456").as_deref(),
            Some("1234567890123456")
        );
        assert_eq!(
            curriculum_id_from_reference("http://buscatextual.cnpq.br/buscatextual/visualizacv.do?id=K4787997A6").as_deref(),
            Some("K4787997A6")
        );
        assert_eq!(curriculum_id_from_reference("K4787997A6").as_deref(), Some("K4787997A6"));
        assert_eq!(curriculum_id_from_reference("Maria da Silva"), None);
    }

    #[test]
    fn test_curriculum_id_patterns_all_compile() {
        assert_eq!(CURRICULUM_ID_PATTERNS.len(), 3);
        assert_eq!(curriculum_id_from_reference(" 1234567890123456 ").as_deref(), Some("1234567890123456"));
    }
}
