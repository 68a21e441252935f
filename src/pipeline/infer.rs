// src/pipeline/infer.rs

//! Sentiment inference over crawled posts.

use serde::Serialize;

use crate::error::Result;
use crate::models::{AnalyzedPost, PostRecord, SentimentLabel, SentimentProbs, TextUsed};
use crate::services::{SentimentBackend, SentimentModel, analyze_posts};

/// Analyzed summaries printed by the inference entrypoint.
pub const SUMMARY_LIMIT: usize = 10;

/// Compact view of an analyzed post.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzedSummary {
    pub doc_id: String,
    pub title: String,
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
    pub sentiment_probs: SentimentProbs,
    pub text_used: TextUsed,
    pub model_version: String,
    pub url: String,
}

impl From<&AnalyzedPost> for AnalyzedSummary {
    fn from(post: &AnalyzedPost) -> Self {
        Self {
            doc_id: post.doc_id(),
            title: post.title.clone(),
            sentiment_label: post.sentiment_label,
            sentiment_score: post.sentiment_score,
            sentiment_probs: post.sentiment_probs,
            text_used: post.text_used,
            model_version: post.model_version.clone(),
            url: post.url.clone(),
        }
    }
}

/// Score crawled posts.
pub async fn run_infer<B: SentimentBackend>(
    posts: &[PostRecord],
    model: &SentimentModel<B>,
    text_used: TextUsed,
) -> Result<Vec<AnalyzedPost>> {
    let analyzed = analyze_posts(posts, model, text_used).await?;
    log::info!("Analyzed posts: {}", analyzed.len());
    Ok(analyzed)
}

/// Summaries of the first `limit` analyzed posts.
pub fn summarize_analyzed(analyzed: &[AnalyzedPost], limit: usize) -> Vec<AnalyzedSummary> {
    analyzed.iter().take(limit).map(AnalyzedSummary::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serialization() {
        let post = AnalyzedPost {
            board_id: 5558,
            post_id: 3,
            url: "https://m.inven.co.kr/board/lostark/5558/3".to_string(),
            title: "제목".to_string(),
            content: None,
            author: None,
            created_at: None,
            crawled_at: "2026-01-28T04:28:48+00:00".to_string(),
            sentiment_label: SentimentLabel::Neu,
            sentiment_score: 0.0,
            sentiment_probs: SentimentProbs::new(0.0, 1.0, 0.0),
            model_version: "v1".to_string(),
            text_used: TextUsed::Title,
        };

        let value = serde_json::to_value(summarize_analyzed(&[post], SUMMARY_LIMIT)).unwrap();
        assert_eq!(value[0]["doc_id"], "5558:3");
        assert_eq!(value[0]["sentiment_label"], "neu");
        assert_eq!(value[0]["sentiment_probs"]["neu"], 1.0);
        assert_eq!(value[0]["text_used"], "title");
    }
}
