//! Service module

mod poisk_api_service;

pub use poisk_api_service::{PoiskApiService, PoiskApiServiceFull};
