//! Model module
//!
//! Query parameters are defined here; response bodies are the poisk response structs.

mod request;

pub use poisk::models::{ControlResponse, SearchItem, SearchResponse};
pub use poisk::statistics::StatisticsResponse;
pub use request::{IndexPageParams, SearchParams, SearchRequest};
