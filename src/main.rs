//! rustacademic - Researcher profile search across Scholar, Lattes and ORCID
//!
//! ## Usage
//!
//! ### HTTP Server Mode
//! ```bash
//! rustacademic serve --port 8000
//! ```
//!
//! ### Dashboard Mode
//! ```bash
//! rustacademic search "Maria Silva" --platform lattes --type author --export
//! rustacademic consolidated --output ./exports
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustacademic::cookies::CookieJar;
use rustacademic::dashboard::{self, DashboardClient, ResultsSlot, ResultsView, SearchRequest};
use rustacademic::export::SpreadsheetExporter;
use rustacademic::lattes::LattesClient;
use rustacademic::models::Platform;
use rustacademic::normalize::Tab;
use rustacademic::orcid::OrcidClient;
use rustacademic::response::SearchType;
use rustacademic::scholar::{ScholarClient, ScholarOptions};
use rustacademic::search::{SearchService, DEFAULT_MAX_RESULTS};
use rustacademic::server::build_router;
use rustacademic::store::{default_store_path, JsonFileStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Researcher profile search across Scholar, Lattes and ORCID
#[derive(Parser)]
#[command(name = "rustacademic")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "RUSTACADEMIC_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backend HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000", env = "RUSTACADEMIC_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1", env = "RUSTACADEMIC_HOST")]
        host: String,

        /// Research store file (default: ~/.rustacademic/research.json)
        #[arg(long, env = "RUSTACADEMIC_STORE")]
        store: Option<PathBuf>,

        /// Directory for generated spreadsheets
        #[arg(long, default_value = "./exports", env = "RUSTACADEMIC_EXPORT_DIR")]
        export_dir: PathBuf,

        /// Proxy URL for the HTML platforms (e.g., http://127.0.0.1:7890)
        #[arg(long, env = "RUSTACADEMIC_PROXY")]
        proxy: Option<String>,

        /// Scholar mirror site URL
        #[arg(long, env = "RUSTACADEMIC_SCHOLAR_MIRROR")]
        mirror: Option<String>,

        /// Lattes search base URL
        #[arg(long, env = "RUSTACADEMIC_LATTES_URL")]
        lattes_url: Option<String>,

        /// ORCID public API base URL
        #[arg(long, env = "RUSTACADEMIC_ORCID_API")]
        orcid_api: Option<String>,

        /// Scholar cookie file (default: ~/.rustacademic/scholar_cookies.json)
        #[arg(long, env = "RUSTACADEMIC_COOKIES")]
        cookies: Option<PathBuf>,
    },

    /// Search through a running backend and print the results
    Search {
        /// Author name, topic, profile URL or Scholar author id
        query: String,

        /// Backend URL
        #[arg(long, default_value = dashboard::DEFAULT_BACKEND_URL, env = "RUSTACADEMIC_BACKEND")]
        backend: String,

        /// Platform: all, scholar, lattes or orcid
        #[arg(long, default_value = "all")]
        platform: String,

        /// Search type: author, topic, both, profile or publications
        #[arg(long = "type", default_value = "author")]
        search_type: String,

        /// Result tab to show: all, scholar, lattes or orcid
        #[arg(long)]
        tab: Option<String>,

        /// Maximum results per platform
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max: usize,

        /// Keep only aging-research publications
        #[arg(long)]
        filter_keywords: bool,

        /// Save the search in the backend store
        #[arg(long)]
        persist: bool,

        /// Generate a spreadsheet on the backend after the search
        #[arg(long)]
        export: bool,

        /// Collapse records repeated under several response shapes
        #[arg(long)]
        dedup: bool,

        /// Print the raw backend response instead of the rendered view
        #[arg(long)]
        json: bool,
    },

    /// Download the consolidated spreadsheet of every stored search
    Consolidated {
        /// Backend URL
        #[arg(long, default_value = dashboard::DEFAULT_BACKEND_URL, env = "RUSTACADEMIC_BACKEND")]
        backend: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Manage Scholar cookies
    Cookies {
        /// Scholar cookie file (default: ~/.rustacademic/scholar_cookies.json)
        #[arg(long, global = true, env = "RUSTACADEMIC_COOKIES")]
        cookies: Option<PathBuf>,

        #[command(subcommand)]
        action: CookieAction,
    },
}

#[derive(Subcommand)]
enum CookieAction {
    /// Clear stored cookies
    Clear,
    /// Show cookie file path
    Path,
    /// Import a browser cookie export (JSON array); reads stdin when no file is given
    Import {
        file: Option<PathBuf>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.log_json {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Serve {
            port,
            host,
            store,
            export_dir,
            proxy,
            mirror,
            lattes_url,
            orcid_api,
            cookies,
        } => {
            let config = ServerConfig {
                host,
                port,
                store,
                export_dir,
                proxy,
                mirror,
                lattes_url,
                orcid_api,
                cookies,
            };
            run_server(config).await
        }
        Commands::Search {
            query,
            backend,
            platform,
            search_type,
            tab,
            max,
            filter_keywords,
            persist,
            export,
            dedup,
            json,
        } => {
            let platform = match platform.as_str() {
                "all" => None,
                other => Some(other.parse::<Platform>()?),
            };
            let request = SearchRequest {
                query,
                search_type: search_type.parse::<SearchType>()?,
                platform,
                max_results: max,
                filter_keywords,
                persist,
            };
            let tab = match tab {
                Some(tab) => tab.parse::<Tab>()?,
                None => platform.map(Tab::Platform).unwrap_or_default(),
            };
            run_search(&backend, request, tab, export, dedup, json).await
        }
        Commands::Consolidated { backend, output } => run_consolidated(&backend, output).await,
        Commands::Cookies { cookies, action } => handle_cookies(open_cookie_jar(cookies)?, action),
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

struct ServerConfig {
    host: String,
    port: u16,
    store: Option<PathBuf>,
    export_dir: PathBuf,
    proxy: Option<String>,
    mirror: Option<String>,
    lattes_url: Option<String>,
    orcid_api: Option<String>,
    cookies: Option<PathBuf>,
}

async fn run_server(config: ServerConfig) -> Result<()> {
    let store_path = match config.store {
        Some(path) => path,
        None => default_store_path()?,
    };
    let store = JsonFileStore::open(&store_path)
        .await
        .with_context(|| format!("Failed to open store {:?}", store_path))?;

    let cookies = open_cookie_jar(config.cookies)?;
    if cookies.header().is_none() {
        warn!(path = ?cookies.path(), "No Scholar cookies; import them with `rustacademic cookies import`");
    }

    let scholar = ScholarClient::new(ScholarOptions {
        proxy: config.proxy.clone(),
        base_url: config.mirror,
        cookies,
        polite_delay: true,
    })?;
    let lattes = LattesClient::new(config.proxy.as_deref(), config.lattes_url.as_deref())?;
    let orcid = OrcidClient::new(config.orcid_api.as_deref())?;

    let service = SearchService::new(Arc::new(store), SpreadsheetExporter::new(&config.export_dir))?
        .with_source(Arc::new(scholar))
        .with_source(Arc::new(lattes))
        .with_source(Arc::new(orcid));
    let app = build_router(service);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid host:port")?;

    info!(
        addr = %addr,
        store = ?store_path,
        export_dir = ?config.export_dir,
        "Starting HTTP server"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

// ============================================================================
// Dashboard
// ============================================================================

async fn run_search(backend: &str, request: SearchRequest, tab: Tab, export: bool, dedup: bool, json: bool) -> Result<()> {
    let client = DashboardClient::new(backend)?;
    let slot = ResultsSlot::default();

    let ticket = slot.ticket();
    let response = client.search(&request).await;
    slot.publish(ticket, response);
    let response = slot.current().context("No search results")?;

    let view = ResultsView::from_response(&response, dedup);
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", dashboard::render(&view, tab));
    }

    if export {
        if !view.can_export() {
            println!("\nNothing to export.");
            return Ok(());
        }
        println!("\nGenerating spreadsheet...");
        match client.export(&request).await {
            Ok(filename) => println!("Spreadsheet generated: {}", filename),
            Err(e) => println!("Export failed: {}", e),
        }
    }
    Ok(())
}

async fn run_consolidated(backend: &str, output: PathBuf) -> Result<()> {
    let client = DashboardClient::new(backend)?;
    let export = client.consolidated().await?;

    std::fs::create_dir_all(&output).context("Failed to create output directory")?;
    let path = output.join(&export.filename);
    std::fs::write(&path, &export.bytes).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Saved: {:?}", path);
    Ok(())
}

// ============================================================================
// Cookie Management
// ============================================================================

/// Jar at `path`, or at the default location when none is given.
fn open_cookie_jar(path: Option<PathBuf>) -> Result<CookieJar> {
    Ok(match path {
        Some(path) => CookieJar::with_path(path),
        None => CookieJar::new()?,
    })
}

fn handle_cookies(jar: CookieJar, action: CookieAction) -> Result<()> {
    match action {
        CookieAction::Clear => {
            jar.clear()?;
            println!("Cookies cleared.");
        }
        CookieAction::Path => {
            println!("Cookie file: {:?}", jar.path());
        }
        CookieAction::Import { file } => {
            let content = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {:?}", path))?,
                None => {
                    println!("1. Open https://scholar.google.com and complete any CAPTCHA");
                    println!("2. Export the cookies as JSON with a cookie export extension");
                    println!("3. Paste the JSON array below and press Ctrl-D");
                    std::io::read_to_string(std::io::stdin())?
                }
            };
            let count = jar.import(&content)?;
            println!("Saved {} cookies to {:?}", count, jar.path());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_jar_for(args: &[&str]) -> Result<CookieJar> {
        match Cli::try_parse_from(args)?.command {
            Commands::Cookies { cookies, .. } => open_cookie_jar(cookies),
            _ => anyhow::bail!("not a cookies command"),
        }
    }

    #[test]
    fn test_cookies_command_honors_custom_path() -> Result<()> {
        let jar = cookie_jar_for(&["rustacademic", "cookies", "--cookies", "/srv/jar.json", "path"])?;
        assert_eq!(jar.path(), std::path::Path::new("/srv/jar.json"));

        let jar = cookie_jar_for(&["rustacademic", "cookies", "import", "--cookies", "/srv/jar.json", "export.json"])?;
        assert_eq!(jar.path(), std::path::Path::new("/srv/jar.json"));
        Ok(())
    }

    #[test]
    fn test_import_lands_in_custom_jar() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let jar_path = dir.path().join("jar.json").to_string_lossy().to_string();
        let export = dir.path().join("export.json").to_string_lossy().to_string();
        std::fs::write(&export, r#"[{"name": "GSP", "value": "abc", "domain": "scholar.google.com"}]"#)?;

        let args = ["rustacademic", "cookies", "--cookies", jar_path.as_str(), "import", export.as_str()];
        let Commands::Cookies { cookies, action } = Cli::try_parse_from(args)?.command else {
            anyhow::bail!("not a cookies command");
        };
        handle_cookies(open_cookie_jar(cookies)?, action)?;

        assert_eq!(CookieJar::with_path(&jar_path).header().as_deref(), Some("GSP=abc"));
        Ok(())
    }
}
