//! poisk-api crate
//!
//! Web server exposing site indexing and search as an HTTP API.
//!
//! ## Endpoints
//! - `GET /api/startIndexing` - Start indexing every configured site
//! - `GET /api/stopIndexing` - Stop the current indexing run
//! - `POST /api/indexPage?url=...` - Re-index a single page
//! - `GET /api/search?query=...&site=...&offset=...&limit=...` - Ranked search
//! - `GET /api/statistics` - Corpus statistics
//! - `GET /health` - Health Check
//!
//! ## Usage Example
//! ```bash
//! curl "http://127.0.0.1:8080/api/search?query=leopard&limit=10"
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;

pub use api::AppState;
pub use config::Config;
pub use errors::{ApiError, ApiErrorKind};
pub use models::{IndexPageParams, SearchParams, SearchRequest};
pub use service::{PoiskApiService, PoiskApiServiceFull};
