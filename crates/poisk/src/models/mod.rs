//! models module
pub mod model_definition;

pub use model_definition::{
  ControlResponse, IndexEntry, Lemma, LemmaId, Page, PageId, SearchItem, SearchResponse, Site,
  SiteId, SiteStatus,
};
