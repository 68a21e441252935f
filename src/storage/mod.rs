//! Sink abstractions for publishing analyzed posts.
//!
//! A sink receives keyed JSON records. The key is the post's document id
//! (`{board_id}:{post_id}`) so downstream consumers can partition and
//! de-duplicate on it.
//!
//! ```text
//! AnalyzedPost ──to_sink_record──▶ SinkRecord { key, value } ──send_many──▶ Sink
//! ```

pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::models::AnalyzedPost;

// Re-export for convenience
pub use local::LocalSink;

/// One keyed message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkRecord {
    /// Partitioning key, must be non-empty
    pub key: String,
    /// JSON payload
    pub value: Value,
}

/// Trait for publishing backends.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver every record and wait for acknowledgement.
    ///
    /// Returns the number of acknowledged records. The batch fails on the
    /// first record with an empty key or the first failed delivery.
    async fn send_many(&self, records: &[SinkRecord]) -> Result<usize>;
}

/// Published payload for an analyzed post.
pub fn to_sink_record(post: &AnalyzedPost) -> SinkRecord {
    let doc_id = post.doc_id();
    SinkRecord {
        key: doc_id.clone(),
        value: json!({
            "doc_id": doc_id,
            "board_id": post.board_id,
            "post_id": post.post_id,
            "title": post.title,
            "url": post.url,
            "sentiment_label": post.sentiment_label,
            "sentiment_score": post.sentiment_score,
            "sentiment_probs": post.sentiment_probs,
            "text_used": post.text_used,
            "model_version": post.model_version,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SentimentLabel, SentimentProbs, TextUsed};

    #[test]
    fn test_to_sink_record_payload() {
        let post = AnalyzedPost {
            board_id: 5558,
            post_id: 85872,
            url: "https://m.inven.co.kr/board/lostark/5558/85872".to_string(),
            title: "테스트".to_string(),
            content: Some("본문".to_string()),
            author: Some("닉네임".to_string()),
            created_at: None,
            crawled_at: "2026-01-28T04:28:48+00:00".to_string(),
            sentiment_label: SentimentLabel::Pos,
            sentiment_score: 0.5,
            sentiment_probs: SentimentProbs::new(0.1, 0.3, 0.6),
            model_version: "kcbert-finetuned-v1".to_string(),
            text_used: TextUsed::Title,
        };

        let record = to_sink_record(&post);
        assert_eq!(record.key, "5558:85872");
        assert_eq!(record.value["doc_id"], "5558:85872");
        assert_eq!(record.value["sentiment_label"], "pos");
        assert_eq!(record.value["text_used"], "title");
        assert_eq!(record.value["sentiment_probs"]["pos"], 0.6);
        // body and author stay out of the published payload
        assert!(record.value.get("content").is_none());
        assert!(record.value.get("author").is_none());
    }
}
