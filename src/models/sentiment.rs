//! Sentiment result types and the analyzed post schema.

use serde::{Deserialize, Serialize};

/// Three-way sentiment label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Neg,
    Neu,
    Pos,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Neg => "neg",
            SentimentLabel::Neu => "neu",
            SentimentLabel::Pos => "pos",
        }
    }
}

/// Allowed drift of a probability triple's sum from 1.
pub const PROB_SUM_TOLERANCE: f64 = 1e-3;

/// Class probabilities in `[neg, neu, pos]` order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SentimentProbs {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
}

impl SentimentProbs {
    pub fn new(neg: f64, neu: f64, pos: f64) -> Self {
        Self { neg, neu, pos }
    }

    /// Each value finite and in `[0, 1]`, summing to 1 within tolerance.
    pub fn is_distribution(&self) -> bool {
        let values = [self.neg, self.neu, self.pos];
        values.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p))
            && (values.iter().sum::<f64>() - 1.0).abs() <= PROB_SUM_TOLERANCE
    }

    fn max(&self) -> f64 {
        self.neg.max(self.neu).max(self.pos)
    }

    /// Highest class; ties resolve pos, then neg, then neu.
    fn argmax(&self) -> SentimentLabel {
        if self.pos >= self.neu && self.pos >= self.neg {
            SentimentLabel::Pos
        } else if self.neg >= self.neu && self.neg >= self.pos {
            SentimentLabel::Neg
        } else {
            SentimentLabel::Neu
        }
    }
}

/// Standardized sentiment output for one text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// `pos - neg`, within `[-1, 1]`
    pub score: f64,
    pub probs: SentimentProbs,
}

impl SentimentResult {
    /// Result for blank input.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neu,
            score: 0.0,
            probs: SentimentProbs::new(0.0, 1.0, 0.0),
        }
    }

    /// Derive label and score from probabilities.
    ///
    /// With a positive `neutral_floor`, low-confidence predictions are
    /// labelled neutral while keeping their probabilities and score.
    pub fn from_probs(probs: SentimentProbs, neutral_floor: f64) -> Self {
        let label = if neutral_floor > 0.0 && probs.max() < neutral_floor {
            SentimentLabel::Neu
        } else {
            probs.argmax()
        };

        Self {
            label,
            score: probs.pos - probs.neg,
            probs,
        }
    }
}

/// Which post fields feed the sentiment model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TextUsed {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "title+content")]
    TitleAndContent,
}

impl TextUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextUsed::Title => "title",
            TextUsed::TitleAndContent => "title+content",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "title" => Some(TextUsed::Title),
            "title+content" => Some(TextUsed::TitleAndContent),
            _ => None,
        }
    }
}

/// A post enriched with its sentiment, ready for indexing or publishing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedPost {
    pub board_id: u32,
    pub post_id: u64,
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<String>,
    /// RFC 3339 UTC timestamp shared by the whole batch
    pub crawled_at: String,

    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
    pub sentiment_probs: SentimentProbs,
    pub model_version: String,
    pub text_used: TextUsed,
}

impl AnalyzedPost {
    pub fn doc_id(&self) -> String {
        format!("{}:{}", self.board_id, self.post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_result() {
        let result = SentimentResult::neutral();
        assert_eq!(result.label, SentimentLabel::Neu);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.probs, SentimentProbs::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_from_probs_argmax_and_score() {
        let result = SentimentResult::from_probs(SentimentProbs::new(0.7, 0.2, 0.1), 0.0);
        assert_eq!(result.label, SentimentLabel::Neg);
        assert!((result.score - (-0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_from_probs_tie_prefers_pos() {
        let result = SentimentResult::from_probs(SentimentProbs::new(0.4, 0.2, 0.4), 0.0);
        assert_eq!(result.label, SentimentLabel::Pos);
    }

    #[test]
    fn test_neutral_floor() {
        let probs = SentimentProbs::new(0.2, 0.35, 0.45);
        assert_eq!(
            SentimentResult::from_probs(probs, 0.5).label,
            SentimentLabel::Neu
        );
        assert_eq!(
            SentimentResult::from_probs(probs, 0.4).label,
            SentimentLabel::Pos
        );
    }

    #[test]
    fn test_is_distribution() {
        assert!(SentimentProbs::new(0.2, 0.3, 0.5).is_distribution());
        assert!(SentimentProbs::new(0.0, 1.0, 0.0).is_distribution());
        assert!(!SentimentProbs::new(-3.0, 0.0, 5.0).is_distribution());
        assert!(!SentimentProbs::new(0.5, 0.5, 0.5).is_distribution());
        assert!(!SentimentProbs::new(f64::NAN, 0.5, 0.5).is_distribution());
        assert!(!SentimentProbs::new(0.0, f64::INFINITY, 0.0).is_distribution());
    }

    #[test]
    fn test_text_used_serde_names() {
        assert_eq!(
            serde_json::to_string(&TextUsed::TitleAndContent).unwrap(),
            "\"title+content\""
        );
        assert_eq!(TextUsed::parse("title"), Some(TextUsed::Title));
        assert_eq!(TextUsed::parse("body"), None);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SentimentLabel::Pos).unwrap(), "\"pos\"");
    }
}
