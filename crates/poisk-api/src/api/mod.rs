//! API module

mod handlers;
mod routes;
mod state;

pub use handlers::{get_search, get_start_indexing, get_statistics, get_stop_indexing, health_check, post_index_page};
pub use routes::{create_router, run_server};
pub use state::AppState;
