//! # rustacademic
//!
//! Researcher profile search across Scholar, Lattes and ORCID - Rust Microservice
//!
//! ## Modules
//!
//! - [`scholar`], [`lattes`], [`orcid`] - Platform clients behind [`source::ResearchSource`]
//! - [`search`] - Fan-out, keyword filtering, persistence and export of searches
//! - [`server`] - axum HTTP surface
//! - [`store`] - Document store of saved searches
//! - [`export`] - CSV spreadsheets
//! - [`normalize`] - Flattens any response shape into platform-tagged items
//! - [`stats`] - Export statistics of a response
//! - [`dashboard`] - Backend client and terminal rendering
//! - [`cookies`] - Scholar cookie persistence
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustacademic::dashboard::{DashboardClient, ResultsView, DEFAULT_BACKEND_URL};
//! use rustacademic::dashboard::SearchRequest;
//! use rustacademic::response::SearchType;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DashboardClient::new(DEFAULT_BACKEND_URL)?;
//!     let request = SearchRequest {
//!         query: "envelhecimento".into(),
//!         search_type: SearchType::Topic,
//!         platform: None,
//!         max_results: 10,
//!         filter_keywords: false,
//!         persist: false,
//!     };
//!     let view = ResultsView::from_response(&client.search(&request).await, false);
//!     println!("Found {} items", view.items.len());
//!     Ok(())
//! }
//! ```

pub mod challenge;
pub mod cookies;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod keywords;
pub mod lattes;
pub mod models;
pub mod normalize;
pub mod orcid;
pub mod response;
pub mod scholar;
pub mod search;
pub mod server;
pub mod source;
pub mod stats;
pub mod store;

pub use error::{AcademicError, Result};
