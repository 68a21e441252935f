// src/pipeline/crawl.rs

//! Post crawling pipeline.

use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, PostRecord};
use crate::services::BoardCrawler;
use crate::utils::PageSource;
use crate::utils::text::preview;

/// Posts printed by the crawl entrypoint.
pub const POST_SUMMARY_LIMIT: usize = 5;

/// Characters of body text shown in a crawl summary.
pub const CONTENT_PREVIEW_CHARS: usize = 120;

/// Compact view of a crawled post for terminal output.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostSummary {
    pub board_id: u32,
    pub post_id: u64,
    pub url: String,
    pub category: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub content_preview: String,
}

impl From<&PostRecord> for PostSummary {
    fn from(post: &PostRecord) -> Self {
        Self {
            board_id: post.board_id,
            post_id: post.post_id,
            url: post.url.clone(),
            category: post.category.clone(),
            title: post.title.clone(),
            author: post.author.clone(),
            created_at: post.created_at.clone(),
            content_preview: preview(&post.content, CONTENT_PREVIEW_CHARS),
        }
    }
}

/// Crawl the configured board: list pages, then every post detail.
pub async fn run_crawl<S: PageSource>(
    crawler: &BoardCrawler<S>,
    config: &Config,
) -> Result<Vec<PostRecord>> {
    let refs = crawler
        .fetch_refs(config.board.max_list_pages, config.board.max_posts_per_run)
        .await?;
    log::info!("Fetched refs: {}", refs.len());

    let posts = crawler.fetch_posts(&refs).await;
    log::info!("Fetched posts: {}", posts.len());

    Ok(posts)
}

/// Summaries of the first `limit` posts.
pub fn summarize_posts(posts: &[PostRecord], limit: usize) -> Vec<PostSummary> {
    posts.iter().take(limit).map(PostSummary::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, content: &str) -> PostRecord {
        PostRecord {
            board_id: 5558,
            post_id: id,
            url: format!("https://m.inven.co.kr/board/lostark/5558/{id}"),
            title: "제목".to_string(),
            category: Some("잡담".to_string()),
            author: None,
            created_at: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_summary_truncates_content() {
        let long = "가".repeat(130);
        let summary = PostSummary::from(&post(1, &long));
        assert_eq!(summary.content_preview.chars().count(), 121);
        assert!(summary.content_preview.ends_with('…'));

        let short = PostSummary::from(&post(2, "짧은 본문"));
        assert_eq!(short.content_preview, "짧은 본문");
    }

    #[test]
    fn test_summarize_posts_limit() {
        let posts: Vec<PostRecord> = (1..=7).map(|i| post(i, "")).collect();
        let summaries = summarize_posts(&posts, POST_SUMMARY_LIMIT);
        assert_eq!(summaries.len(), 5);
        assert_eq!(summaries[4].post_id, 5);
        assert!(summarize_posts(&[], 5).is_empty());
    }
}
