// src/services/detail.rs

//! Post detail page extraction.
//!
//! Detail pages carry no stable ids or classes for the fields we need, so
//! the page is flattened to text lines and the fields are located by their
//! neighbours: the author sits right above the view counter, the body starts
//! right after the timestamp and ends at the first action button.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Layout, PostRecord, PostRef, TITLE_SCAN_WINDOW};
use crate::utils::text::{char_len, flatten_lines, joined_text};

/// Prefix of the view counter line (`조회: 45`).
pub const VIEW_COUNT_MARKER: &str = "조회:";

/// Prefix of the recommend counter line (`추천: 3`).
pub const RECOMMEND_MARKER: &str = "추천:";

/// Action button labels that end the post body.
pub const STOP_MARKERS: &[&str] = &[
    "추천확인",
    "신고",
    "스팸신고",
    "공유",
    "스크랩",
    "댓글쓰기",
    "댓글보기",
    "목록",
];

/// Start of the trending banner that follows the body on generic boards.
pub const TRENDING_PREFIX: &str = "지금 뜨는 인벤";

/// Words that mark a line as page chrome rather than a nickname.
const AUTHOR_BLACKLIST: &[&str] = &["게시판", "인벤", "광고"];

const MAX_AUTHOR_CHARS: usize = 20;

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}(?::\d{2})?\b").expect("valid timestamp regex")
});

/// Parses detail pages for one layout.
#[derive(Debug)]
pub struct DetailExtractor {
    layout: Layout,
    heading: Selector,
}

impl DetailExtractor {
    pub fn new(layout: Layout) -> Result<Self> {
        let heading = Selector::parse("h2").map_err(|e| AppError::selector("h2", format!("{e:?}")))?;
        Ok(Self { layout, heading })
    }

    /// Build a record from a detail page and the reference that led to it.
    pub fn parse(&self, html: &str, post_ref: &PostRef) -> Result<PostRecord> {
        let document = Html::parse_document(html);
        let lines = flatten_lines(&document);
        if lines.is_empty() {
            return Err(AppError::parse(
                format!("post {}", post_ref.post_id),
                "document has no visible text",
            ));
        }

        let generic = matches!(self.layout, Layout::Generic);
        let window = self.layout.scan_window();

        let title = if self.layout.trusts_detail_heading() {
            document
                .select(&self.heading)
                .next()
                .map(|h| joined_text(&h))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| post_ref.title.clone())
        } else {
            post_ref.title.clone()
        };

        let timestamp = find_timestamp(&lines, window);
        let author = find_author(&lines, window, generic);

        let start = match &timestamp {
            Some((index, _)) => index + 1,
            None if generic => find_title_line(&lines, &title).map_or(0, |i| i + 1),
            None => 0,
        };
        let content = extract_content(&lines, start, generic);

        Ok(PostRecord {
            board_id: post_ref.board_id,
            post_id: post_ref.post_id,
            url: post_ref.url.clone(),
            title,
            category: post_ref.category.clone(),
            author,
            created_at: timestamp.map(|(_, ts)| ts),
            content,
        })
    }
}

/// First `YYYY-MM-DD HH:MM[:SS]` within the window, with its line index.
pub fn find_timestamp(lines: &[String], window: usize) -> Option<(usize, String)> {
    lines.iter().take(window).enumerate().find_map(|(i, line)| {
        TIMESTAMP
            .find(line)
            .map(|m| (i, m.as_str().to_string()))
    })
}

/// The line right above the first view counter, if it looks like a nickname.
pub fn find_author(lines: &[String], window: usize, use_blacklist: bool) -> Option<String> {
    let index = lines
        .iter()
        .take(window)
        .enumerate()
        .position(|(i, line)| i > 0 && line.starts_with(VIEW_COUNT_MARKER))?;

    let candidate = &lines[index - 1];
    let len = char_len(candidate);
    if !(1..=MAX_AUTHOR_CHARS).contains(&len) {
        return None;
    }
    if use_blacklist && AUTHOR_BLACKLIST.iter().any(|w| candidate.contains(w)) {
        return None;
    }
    Some(candidate.clone())
}

fn find_title_line(lines: &[String], title: &str) -> Option<usize> {
    if title.is_empty() {
        return None;
    }
    lines
        .iter()
        .take(TITLE_SCAN_WINDOW)
        .position(|line| line.contains(title))
}

/// Body lines from `start` up to the first stop marker.
///
/// Counter lines are dropped; with `stop_at_trending` the trending banner
/// also ends the body.
pub fn extract_content(lines: &[String], start: usize, stop_at_trending: bool) -> String {
    let mut body = Vec::new();
    for line in lines.iter().skip(start) {
        if STOP_MARKERS.contains(&line.as_str()) {
            break;
        }
        if stop_at_trending && line.starts_with(TRENDING_PREFIX) {
            break;
        }
        if line.starts_with(VIEW_COUNT_MARKER) || line.starts_with(RECOMMEND_MARKER) {
            continue;
        }
        body.push(line.as_str());
    }
    body.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructuredLayout;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn sample_ref() -> PostRef {
        PostRef {
            board_id: 5558,
            post_id: 85872,
            url: "https://m.inven.co.kr/board/lostark/5558/85872".to_string(),
            title: "dummy".to_string(),
            category: Some("잡담".to_string()),
        }
    }

    const SAMPLE: &str = r#"
        <html><body>
          <h2>[잡담] 테스트 제목</h2>
          <div>닉네임123</div>
          <div>조회: 45</div>
          <div>2026-01-28 13:28:48</div>
          <div>첫 번째 줄 본문</div>
          <div>두 번째 줄 본문</div>
          <div>추천확인</div>
          <div>댓글 영역</div>
        </body></html>
    "#;

    #[test]
    fn test_generic_parse() {
        let extractor = DetailExtractor::new(Layout::Generic).unwrap();
        let post = extractor.parse(SAMPLE, &sample_ref()).unwrap();

        assert_eq!(post.title, "[잡담] 테스트 제목");
        assert_eq!(post.created_at.as_deref(), Some("2026-01-28 13:28:48"));
        assert_eq!(post.author.as_deref(), Some("닉네임123"));
        assert_eq!(post.content, "첫 번째 줄 본문\n두 번째 줄 본문");
        assert_eq!(post.category.as_deref(), Some("잡담"));
        assert_eq!(post.post_id, 85872);
    }

    #[test]
    fn test_structured_trusts_ref_title() {
        let extractor =
            DetailExtractor::new(Layout::Structured(StructuredLayout::subject(5558))).unwrap();
        let post = extractor.parse(SAMPLE, &sample_ref()).unwrap();

        assert_eq!(post.title, "dummy");
        assert_eq!(post.content, "첫 번째 줄 본문\n두 번째 줄 본문");
    }

    #[test]
    fn test_empty_document_is_parse_error() {
        let extractor = DetailExtractor::new(Layout::Generic).unwrap();
        let err = extractor
            .parse("<html><body>  </body></html>", &sample_ref())
            .unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[test]
    fn test_missing_heading_falls_back_to_ref_title() {
        let extractor = DetailExtractor::new(Layout::Generic).unwrap();
        let html = "<div>머리글</div><div>dummy</div><div>본문 내용</div><div>목록</div>";
        let post = extractor.parse(html, &sample_ref()).unwrap();

        assert_eq!(post.title, "dummy");
        assert_eq!(post.created_at, None);
        assert_eq!(post.content, "본문 내용");
    }

    #[test]
    fn test_content_between_timestamp_and_stop_marker() {
        let lines = lines(&[
            "헤더",
            "2026-01-28 13:28:48",
            "본문 하나",
            "조회: 10",
            "본문 둘",
            "추천확인",
            "이후 내용",
        ]);
        let (index, ts) = find_timestamp(&lines, 140).unwrap();
        assert_eq!(ts, "2026-01-28 13:28:48");

        let content = extract_content(&lines, index + 1, true);
        assert_eq!(content, "본문 하나\n본문 둘");
        assert!(!content.contains("추천확인"));
        assert!(!content.contains("이후 내용"));
    }

    #[test]
    fn test_timestamp_without_seconds_and_embedded() {
        let lines = lines(&["작성일 2025-12-01 09:05 수정됨"]);
        assert_eq!(
            find_timestamp(&lines, 140),
            Some((0, "2025-12-01 09:05".to_string()))
        );
    }

    #[test]
    fn test_timestamp_outside_window_ignored() {
        let mut raw: Vec<String> = (0..130).map(|i| format!("줄 {i}")).collect();
        raw.push("2026-01-28 13:28:48".to_string());
        assert!(find_timestamp(&raw, 140).is_some());
        assert!(find_timestamp(&raw, 120).is_none());
    }

    #[test]
    fn test_author_blacklist_is_generic_only() {
        let lines = lines(&["인벤러", "조회: 3"]);
        assert_eq!(find_author(&lines, 140, true), None);
        assert_eq!(find_author(&lines, 120, false).as_deref(), Some("인벤러"));
    }

    #[test]
    fn test_author_rejects_long_candidate() {
        let long = "가".repeat(21);
        let lines = lines(&[long.as_str(), "조회: 3"]);
        assert_eq!(find_author(&lines, 140, false), None);
    }

    #[test]
    fn test_author_ignores_counter_on_first_line() {
        let lines = lines(&["조회: 1", "작성자", "조회: 2"]);
        assert_eq!(find_author(&lines, 140, true).as_deref(), Some("작성자"));
    }

    #[test]
    fn test_trending_banner_generic_only() {
        let lines = lines(&["본문", "지금 뜨는 인벤 소식", "배너 뒤"]);
        assert_eq!(extract_content(&lines, 0, true), "본문");
        assert_eq!(
            extract_content(&lines, 0, false),
            "본문\n지금 뜨는 인벤 소식\n배너 뒤"
        );
    }

    #[test]
    fn test_recommend_line_skipped_not_terminating() {
        let lines = lines(&["추천: 5", "본문", "신고"]);
        assert_eq!(extract_content(&lines, 0, true), "본문");
    }
}
