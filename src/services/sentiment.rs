// src/services/sentiment.rs

//! Sentiment scoring of crawled posts.
//!
//! [`SentimentModel`] is a long-lived handle built once per run and passed by
//! reference. It batches texts, short-circuits blank ones to neutral and
//! delegates the actual probabilities to a [`SentimentBackend`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{
    AnalyzedPost, PostRecord, SentimentProbs, SentimentResult, SentimentSettings, TextUsed,
};

const BACKEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Produces `[neg, neu, pos]` probabilities for non-blank texts.
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    /// One probability triple per input text, in input order.
    async fn predict_probs(&self, texts: &[String], max_length: usize)
    -> Result<Vec<SentimentProbs>>;
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    texts: &'a [String],
    max_length: usize,
}

#[derive(Deserialize)]
struct PredictResponse {
    probs: Vec<[f64; 3]>,
}

/// Backend calling an HTTP inference server.
pub struct HttpSentimentBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSentimentBackend {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint).map_err(|e| {
            AppError::config(format!("sentiment endpoint '{endpoint}' is not a valid URL: {e}"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(BACKEND_TIMEOUT)
            .build()
            .map_err(|e| AppError::config(format!("failed to build sentiment client: {e}")))?;

        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl SentimentBackend for HttpSentimentBackend {
    async fn predict_probs(
        &self,
        texts: &[String],
        max_length: usize,
    ) -> Result<Vec<SentimentProbs>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&PredictRequest { texts, max_length })
            .send()
            .await
            .map_err(|e| AppError::sentiment(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::sentiment(format!(
                "{} responded with HTTP {}",
                self.endpoint,
                status.as_u16()
            )));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| AppError::sentiment(format!("malformed response: {e}")))?;

        Ok(body
            .probs
            .into_iter()
            .map(|[neg, neu, pos]| SentimentProbs::new(neg, neu, pos))
            .collect())
    }
}

/// Batched sentiment model handle.
pub struct SentimentModel<B> {
    backend: B,
    model_version: String,
    batch_size: usize,
    max_length: usize,
    neutral_floor: f64,
}

impl<B: SentimentBackend> SentimentModel<B> {
    pub fn new(settings: &SentimentSettings, backend: B) -> Result<Self> {
        settings.validate()?;
        log::info!(
            "Sentiment model ready: version={} batch={} max_length={}",
            settings.model_version,
            settings.batch_size,
            settings.max_length
        );

        Ok(Self {
            backend,
            model_version: settings.model_version.clone(),
            batch_size: settings.batch_size,
            max_length: settings.max_length,
            neutral_floor: settings.neutral_floor,
        })
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Score texts; the output has the same length and order as the input.
    ///
    /// Blank texts are neutral and never reach the backend.
    pub async fn predict(&self, texts: &[String]) -> Result<Vec<SentimentResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            results.extend(self.predict_batch(batch).await?);
        }
        Ok(results)
    }

    async fn predict_batch(&self, batch: &[String]) -> Result<Vec<SentimentResult>> {
        let mut results = vec![SentimentResult::neutral(); batch.len()];

        let (indices, texts): (Vec<usize>, Vec<String>) = batch
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| (i, text.clone()))
            .unzip();
        if texts.is_empty() {
            return Ok(results);
        }

        let probs = self.backend.predict_probs(&texts, self.max_length).await?;
        if probs.len() != texts.len() {
            return Err(AppError::sentiment(format!(
                "backend returned {} results for {} texts",
                probs.len(),
                texts.len()
            )));
        }

        if let Some(bad) = probs.iter().find(|p| !p.is_distribution()) {
            return Err(AppError::sentiment(format!(
                "backend returned an invalid distribution: neg={} neu={} pos={}",
                bad.neg, bad.neu, bad.pos
            )));
        }

        for (index, p) in indices.into_iter().zip(probs) {
            results[index] = SentimentResult::from_probs(p, self.neutral_floor);
        }
        Ok(results)
    }
}

/// Text fed to the model for one post.
pub fn build_text(post: &PostRecord, text_used: TextUsed) -> String {
    let title = post.title.trim();
    if text_used == TextUsed::Title {
        return title.to_string();
    }

    let content = post.content.trim();
    match (title.is_empty(), content.is_empty()) {
        (_, true) => title.to_string(),
        (true, false) => content.to_string(),
        (false, false) => format!("{title}\n\n{content}"),
    }
}

/// Score posts, keeping input order. All outputs share one `crawled_at`.
pub async fn analyze_posts<B: SentimentBackend>(
    posts: &[PostRecord],
    model: &SentimentModel<B>,
    text_used: TextUsed,
) -> Result<Vec<AnalyzedPost>> {
    let texts: Vec<String> = posts.iter().map(|p| build_text(p, text_used)).collect();
    let results = model.predict(&texts).await?;
    if results.len() != posts.len() {
        return Err(AppError::sentiment("sentiment results size mismatch"));
    }

    let crawled_at = chrono::Utc::now().to_rfc3339();

    Ok(posts
        .iter()
        .zip(results)
        .map(|(post, result)| AnalyzedPost {
            board_id: post.board_id,
            post_id: post.post_id,
            url: post.url.clone(),
            title: post.title.clone(),
            content: Some(post.content.clone()).filter(|c| !c.is_empty()),
            author: post.author.clone(),
            created_at: post.created_at.clone(),
            crawled_at: crawled_at.clone(),
            sentiment_label: result.label,
            sentiment_score: result.score,
            sentiment_probs: result.probs,
            model_version: model.model_version().to_string(),
            text_used,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::SentimentLabel;

    /// Backend answering every text with the same probabilities.
    struct FixedBackend {
        probs: SentimentProbs,
        calls: Mutex<Vec<Vec<String>>>,
        drop_one: bool,
    }

    impl FixedBackend {
        fn new(neg: f64, neu: f64, pos: f64) -> Self {
            Self {
                probs: SentimentProbs::new(neg, neu, pos),
                calls: Mutex::new(Vec::new()),
                drop_one: false,
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SentimentBackend for FixedBackend {
        async fn predict_probs(
            &self,
            texts: &[String],
            _max_length: usize,
        ) -> Result<Vec<SentimentProbs>> {
            self.calls.lock().unwrap().push(texts.to_vec());
            let n = if self.drop_one { texts.len() - 1 } else { texts.len() };
            Ok(vec![self.probs; n])
        }
    }

    fn settings(batch_size: usize) -> SentimentSettings {
        SentimentSettings {
            batch_size,
            ..SentimentSettings::default()
        }
    }

    fn post(title: &str, content: &str) -> PostRecord {
        PostRecord {
            board_id: 5558,
            post_id: 1,
            url: "https://m.inven.co.kr/board/lostark/5558/1".to_string(),
            title: title.to_string(),
            category: None,
            author: None,
            created_at: None,
            content: content.to_string(),
        }
    }

    fn texts(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_text_title_only() {
        assert_eq!(build_text(&post("제목", "본문"), TextUsed::Title), "제목");
    }

    #[test]
    fn test_build_text_title_plus_content() {
        assert_eq!(
            build_text(&post("제목", "본문"), TextUsed::TitleAndContent),
            "제목\n\n본문"
        );
    }

    #[test]
    fn test_build_text_falls_back_to_present_part() {
        assert_eq!(build_text(&post(" 제목 ", ""), TextUsed::TitleAndContent), "제목");
        assert_eq!(build_text(&post("", "본문"), TextUsed::TitleAndContent), "본문");
    }

    #[test]
    fn test_new_rejects_zero_batch_size() {
        let result = SentimentModel::new(&settings(0), FixedBackend::new(0.1, 0.1, 0.8));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_blank_texts_are_neutral_without_backend() {
        let model = SentimentModel::new(&settings(16), FixedBackend::new(0.1, 0.1, 0.8)).unwrap();
        let results = model.predict(&texts(&["", "   \n"])).await.unwrap();

        assert_eq!(results, vec![SentimentResult::neutral(); 2]);
        assert!(model.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_order() {
        let model = SentimentModel::new(&settings(16), FixedBackend::new(0.1, 0.1, 0.8)).unwrap();
        let results = model.predict(&texts(&["좋다", " ", "최고"])).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].label, SentimentLabel::Pos);
        assert_eq!(results[1], SentimentResult::neutral());
        assert_eq!(results[2].label, SentimentLabel::Pos);
        assert!((results[0].score - 0.7).abs() < 1e-9);
        assert_eq!(model.backend.calls(), vec![texts(&["좋다", "최고"])]);
    }

    #[tokio::test]
    async fn test_texts_are_batched() {
        let model = SentimentModel::new(&settings(2), FixedBackend::new(0.6, 0.3, 0.1)).unwrap();
        let results = model
            .predict(&texts(&["a", "b", "c", "d", "e"]))
            .await
            .unwrap();

        assert_eq!(results.len(), 5);
        let sizes: Vec<usize> = model.backend.calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_size_mismatch_is_error() {
        let mut backend = FixedBackend::new(0.6, 0.3, 0.1);
        backend.drop_one = true;
        let model = SentimentModel::new(&settings(4), backend).unwrap();

        let err = model.predict(&texts(&["a", "b"])).await.unwrap_err();
        assert!(matches!(err, AppError::Sentiment(_)));
    }

    #[tokio::test]
    async fn test_invalid_probabilities_are_rejected() {
        for (neg, neu, pos) in [(-3.0, 0.0, 5.0), (f64::NAN, 0.5, 0.5), (0.6, 0.6, 0.6)] {
            let model =
                SentimentModel::new(&settings(16), FixedBackend::new(neg, neu, pos)).unwrap();
            let err = model.predict(&texts(&["텍스트"])).await.unwrap_err();
            assert!(matches!(err, AppError::Sentiment(_)));
        }
    }

    #[tokio::test]
    async fn test_analyze_posts_shares_crawled_at() {
        let model = SentimentModel::new(&settings(16), FixedBackend::new(0.7, 0.2, 0.1)).unwrap();
        let mut second = post("두번째", "");
        second.post_id = 2;
        let posts = vec![post("첫번째", "본문"), second];

        let analyzed = analyze_posts(&posts, &model, TextUsed::TitleAndContent)
            .await
            .unwrap();

        assert_eq!(analyzed.len(), 2);
        assert_eq!(analyzed[0].post_id, 1);
        assert_eq!(analyzed[1].post_id, 2);
        assert_eq!(analyzed[0].crawled_at, analyzed[1].crawled_at);
        assert_eq!(analyzed[0].content.as_deref(), Some("본문"));
        assert_eq!(analyzed[1].content, None);
        assert_eq!(analyzed[0].sentiment_label, SentimentLabel::Neg);
        assert_eq!(analyzed[0].model_version, "kcbert-finetuned-v1");
        assert_eq!(analyzed[0].text_used, TextUsed::TitleAndContent);
        assert_eq!(
            model.backend.calls(),
            vec![texts(&["첫번째\n\n본문", "두번째"])]
        );
    }
}
