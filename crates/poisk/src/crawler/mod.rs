//! Site crawler: fetch collaborator, URL policy, worker pool and the recursive
//! per-site crawl.

pub mod fetcher;
pub mod pool;
pub mod site_crawler;
pub mod url_policy;

pub use fetcher::{FetchedPage, Fetcher, HttpFetcher, StaticFetcher, is_html_content_type};
pub use pool::CrawlPool;
pub use site_crawler::SiteCrawler;
