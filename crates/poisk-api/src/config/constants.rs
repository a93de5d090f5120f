//! API configuration constants

/// Maximum length of a search query in bytes
///
/// Longer queries are rejected before they reach the lemmatizer.
pub const MAX_QUERY_LENGTH: usize = 1_000;

/// Default bind address
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default path of the poisk TOML configuration
pub const DEFAULT_CONFIG_PATH: &str = "poisk.toml";

/// Environment variable holding the bind address
pub const BIND_ADDR_ENV: &str = "POISK_API_BIND_ADDR";

/// Environment variable holding the configuration path
pub const CONFIG_PATH_ENV: &str = "POISK_CONFIG";
