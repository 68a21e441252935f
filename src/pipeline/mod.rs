//! Pipeline entry points for crawler operations.
//!
//! - `run_crawl`: Fetch post references and post details from the board
//! - `run_infer`: Score crawled posts with the sentiment model
//! - `run_publish`: Deliver analyzed payloads to a sink

pub mod crawl;
pub mod infer;
pub mod publish;

pub use crawl::{CONTENT_PREVIEW_CHARS, POST_SUMMARY_LIMIT, PostSummary, run_crawl, summarize_posts};
pub use infer::{AnalyzedSummary, SUMMARY_LIMIT, run_infer, summarize_analyzed};
pub use publish::{PREVIEW_LIMIT, build_records, run_publish};
