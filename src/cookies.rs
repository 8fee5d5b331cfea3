//! Session cookie persistence for the Scholar client.
//!
//! Scholar serves challenge pages to cookie-less clients much sooner. After a
//! challenge is solved in a browser, its cookies are imported here and sent
//! with every Scholar request.

use crate::error::{AcademicError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const COOKIE_FILE: &str = "scholar_cookies.json";

/// Default cookie file path: `~/.rustacademic/scholar_cookies.json`
fn default_cookie_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".rustacademic").join(COOKIE_FILE))
        .ok_or_else(|| AcademicError::Config("Cannot determine home directory".to_string()))
}

/// Cookie entry in the browser export format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, alias = "httpOnly")]
    pub http_only: bool,
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
}

/// Loads and saves the Scholar cookie file.
#[derive(Debug, Clone)]
pub struct CookieJar {
    path: PathBuf,
}

impl CookieJar {
    /// Jar at the default path
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: default_cookie_path()?,
        })
    }

    /// Jar at a custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load cookies from file.
    ///
    /// A missing or unreadable file yields an empty list.
    pub fn load(&self) -> Vec<Cookie> {
        if !self.path.exists() {
            debug!(path = ?self.path, "Cookie file not found");
            return Vec::new();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Vec<Cookie>>(&content) {
                Ok(cookies) => {
                    debug!(count = cookies.len(), path = ?self.path, "Loaded cookies");
                    cookies
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse cookies");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to read cookie file");
                Vec::new()
            }
        }
    }

    /// `Cookie` header value for requests to Google hosts.
    pub fn header(&self) -> Option<String> {
        let header = self
            .load()
            .iter()
            .filter(|c| c.domain.contains("google"))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    pub fn save(&self, cookies: &[Cookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&self.path, content)?;
        info!(count = cookies.len(), path = ?self.path, "Saved cookies");
        Ok(())
    }

    /// Parse a browser cookie export and save it.
    pub fn import(&self, json: &str) -> Result<usize> {
        let cookies: Vec<Cookie> = serde_json::from_str(json)?;
        if cookies.is_empty() {
            return Err(AcademicError::Validation("No cookies in import".to_string()));
        }
        self.save(&cookies)?;
        Ok(cookies.len())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!(path = ?self.path, "Cleared cookies");
        }
        Ok(())
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_path(COOKIE_FILE))
    }
}
