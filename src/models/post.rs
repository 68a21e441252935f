//! Post data structures.

use serde::{Deserialize, Serialize};

/// A post discovered on a board list page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRef {
    /// Numeric board identifier
    pub board_id: u32,

    /// Post identifier, unique within a crawl session
    pub post_id: u64,

    /// Absolute URL of the detail page
    pub url: String,

    /// Post title with any category prefix removed
    pub title: String,

    /// Short category label such as `질문` or `잡담`
    pub category: Option<String>,
}

/// A post parsed from its detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRecord {
    pub board_id: u32,
    pub post_id: u64,
    pub url: String,
    pub title: String,
    pub category: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub content: String,
}

impl PostRecord {
    /// Stable document id used as the publishing key.
    pub fn doc_id(&self) -> String {
        format!("{}:{}", self.board_id, self.post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id() {
        let post = PostRecord {
            board_id: 5558,
            post_id: 85872,
            url: "https://m.inven.co.kr/board/lostark/5558/85872".to_string(),
            title: "테스트".to_string(),
            category: None,
            author: None,
            created_at: None,
            content: String::new(),
        };
        assert_eq!(post.doc_id(), "5558:85872");
    }
}
