//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - URL safety rules (`SafetyGuard`)
//! - List and detail page extraction (`ListExtractor`, `DetailExtractor`)
//! - Pagination and batch fetching (`BoardCrawler`)
//! - Sentiment scoring (`SentimentModel`)

mod board;
mod detail;
mod list;
mod safety;
pub mod sentiment;

pub use board::BoardCrawler;
pub use detail::{DetailExtractor, extract_content, find_author, find_timestamp};
pub use list::ListExtractor;
pub use safety::SafetyGuard;
pub use sentiment::{
    HttpSentimentBackend, SentimentBackend, SentimentModel, analyze_posts, build_text,
};
