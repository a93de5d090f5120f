//! Config module

mod constants;
mod env;

pub use constants::{
  BIND_ADDR_ENV, CONFIG_PATH_ENV, DEFAULT_BIND_ADDR, DEFAULT_CONFIG_PATH, MAX_QUERY_LENGTH,
};
pub use env::Config;
