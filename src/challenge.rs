//! Anti-automation challenge detection.
//!
//! Platform clients run every fetched body through [`check`] before
//! parsing, so a challenge page surfaces as a typed
//! [`AcademicError::Challenge`] instead of an empty or garbled result.

use crate::error::{AcademicError, Result};
use crate::models::Platform;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// CSS selector of a challenge element paired with the marker reported for it.
type Marker = (&'static str, &'static str);

const SCHOLAR_MARKERS: &[Marker] = &[
    ("form#gs_captcha_f", "captcha form"),
    ("form#captcha-form", "captcha form"),
    ("form[action*='/sorry/']", "sorry page"),
    (".g-recaptcha", "recaptcha"),
    ("iframe[src*='recaptcha']", "recaptcha"),
];

const LATTES_MARKERS: &[Marker] = &[
    ("#captcha", "captcha"),
    ("form[action*='captcha']", "captcha form"),
    ("img[src*='captcha']", "captcha image"),
    (".g-recaptcha", "recaptcha"),
    ("input[name='g-recaptcha-response']", "recaptcha"),
    ("iframe[src*='recaptcha']", "recaptcha"),
];

/// ORCID is a JSON API; refusals show up in the HTTP status only.
fn markers(platform: Platform) -> &'static [Marker] {
    match platform {
        Platform::Scholar => SCHOLAR_MARKERS,
        Platform::Lattes => LATTES_MARKERS,
        Platform::Orcid => &[],
    }
}

/// First challenge element found in `body`.
///
/// Only page structure counts: a captcha form, widget or iframe. Words in
/// titles or abstracts never do.
pub fn detect(platform: Platform, body: &str) -> Option<&'static str> {
    let markers = markers(platform);
    let lowered = body.to_lowercase();
    if markers.is_empty() || !(lowered.contains("captcha") || lowered.contains("/sorry/")) {
        return None;
    }
    let document = Html::parse_document(body);
    markers.iter().find_map(|(css, marker)| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next().map(|_| *marker)
    })
}

/// Marker for a request that was redirected to a challenge page.
pub fn detect_redirect(platform: Platform, url: &Url) -> Option<&'static str> {
    match platform {
        Platform::Scholar if url.path().starts_with("/sorry/") => Some("sorry redirect"),
        _ => None,
    }
}

fn challenge_error(platform: Platform, marker: Option<&'static str>) -> Result<()> {
    match marker {
        Some(marker) => Err(AcademicError::Challenge {
            platform,
            marker: marker.to_string(),
        }),
        None => Ok(()),
    }
}

/// Fail with [`AcademicError::Challenge`] when `body` is a challenge page.
pub fn check(platform: Platform, body: &str) -> Result<()> {
    challenge_error(platform, detect(platform, body))
}

/// Fail with [`AcademicError::Challenge`] when the final URL of a request is
/// a challenge page.
pub fn check_redirect(platform: Platform, url: &Url) -> Result<()> {
    challenge_error(platform, detect_redirect(platform, url))
}

/// Manual steps that clear a challenge for `platform`.
pub fn recovery_instructions(platform: Platform) -> &'static str {
    match platform {
        Platform::Scholar => {
            "Open https://scholar.google.com in a browser, solve the CAPTCHA, then export the \
             session cookies with `rustacademic cookies import` and retry."
        }
        Platform::Lattes => {
            "Open http://buscatextual.cnpq.br/buscatextual/busca.do in a browser, complete the \
             verification, wait a few minutes and retry."
        }
        Platform::Orcid => {
            "The ORCID public API refused the request. Wait a few minutes before retrying."
        }
    }
}

/// Challenge report attached to failure responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeNotice {
    pub platform: Platform,
    pub instructions: String,
}

impl ChallengeNotice {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            instructions: recovery_instructions(platform).to_string(),
        }
    }

    /// Notice for `err` when it is a challenge error.
    pub fn from_error(err: &AcademicError) -> Option<Self> {
        match err {
            AcademicError::Challenge { platform, .. } => Some(Self::new(*platform)),
            _ => None,
        }
    }
}

/// Older backends reported challenges by writing "CAPTCHA" into a profile
/// name instead of failing. Spot that sentinel in a raw response.
pub fn legacy_sentinel(response: &Value) -> bool {
    match response {
        Value::Object(map) => map.iter().any(|(key, value)| match value {
            Value::String(s) => (key == "name" || key == "title") && s.contains("CAPTCHA"),
            other => legacy_sentinel(other),
        }),
        Value::Array(items) => items.iter().any(legacy_sentinel),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scholar_captcha_form() {
        let html = r#"<html><body><div>Our systems have detected unusual traffic</div>
            <form id="gs_captcha_f" method="post"><div class="g-recaptcha"></div></form></body></html>"#;
        let err = check(Platform::Scholar, html).expect_err("challenge");
        assert!(err.is_challenge());
        assert!(ChallengeNotice::from_error(&err).is_some());
        assert_eq!(detect(Platform::Scholar, html), Some("captcha form"));
    }

    #[test]
    fn test_result_text_is_not_a_challenge() {
        let html = r#"<div class="gs_ri"><h3 class="gs_rt">Detecting unusual traffic in hospital networks</h3>
            <div class="gs_rs">A CAPTCHA study after solving the above captcha</div></div>"#;
        assert!(check(Platform::Scholar, html).is_ok());
        assert!(check(Platform::Lattes, "<h2 class=\"nome\">Maria</h2><p>Não sou um robô: captcha e idosos</p>").is_ok());
        let orcid = r#"{"title": {"title": {"value": "Usability of CAPTCHA schemes for older adults"}}}"#;
        assert!(check(Platform::Orcid, orcid).is_ok());
    }

    #[test]
    fn test_lattes_recaptcha_widget() {
        let html = r#"<form action="busca.do"><div class="g-recaptcha" data-sitekey="x"></div></form>"#;
        assert_eq!(detect(Platform::Lattes, html), Some("recaptcha"));
        let iframe = r#"<iframe src="https://www.google.com/recaptcha/api2/anchor"></iframe>"#;
        assert_eq!(detect(Platform::Lattes, iframe), Some("recaptcha"));
    }

    #[test]
    fn test_scholar_sorry_redirect() -> Result<()> {
        let sorry = Url::parse("https://www.google.com/sorry/index?continue=x")
            .map_err(|e| AcademicError::Parse(e.to_string()))?;
        assert!(check_redirect(Platform::Scholar, &sorry).is_err());
        let results = Url::parse("https://scholar.google.com/scholar?q=sorry")
            .map_err(|e| AcademicError::Parse(e.to_string()))?;
        assert!(check_redirect(Platform::Scholar, &results).is_ok());
        assert!(check_redirect(Platform::Orcid, &sorry).is_ok());
        Ok(())
    }

    #[test]
    fn test_legacy_sentinel() {
        assert!(legacy_sentinel(&json!({
            "results_by_platform": {"lattes": {"lattes_profiles": [{"name": "CAPTCHA detected"}]}}
        })));
        assert!(!legacy_sentinel(&json!({"data": {"profiles": [{"name": "Ana"}]}})));
    }
}
