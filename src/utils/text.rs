// src/utils/text.rs

//! Text flattening and title helpers shared by the extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use unicode_segmentation::UnicodeSegmentation;

/// Elements whose text is never visible.
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template"];

/// Longest category label recognised in a title.
const MAX_CATEGORY_CHARS: usize = 6;

static BRACKET_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]{1,6})\]\s*(.+)$").expect("valid category regex"));

/// Flatten a document into trimmed, non-blank lines in document order.
///
/// Each text node becomes one or more lines, so block boundaries in the
/// markup survive as line boundaries.
pub fn flatten_lines(document: &Html) -> Vec<String> {
    document
        .tree
        .root()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| INVISIBLE.contains(&el.name()))
            })
        })
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Visible text of an element: text nodes trimmed and joined by one space.
pub fn joined_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Length in Unicode scalar values.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split a leading `[category]` off a title.
///
/// With `token_fallback`, a short first word followed by at least two more
/// characters is also taken as the category (`잡담 내용입니다`).
pub fn split_category(raw: &str, token_fallback: bool) -> (Option<String>, String) {
    let raw = raw.trim();

    if let Some(caps) = BRACKET_CATEGORY.captures(raw) {
        return (Some(caps[1].to_string()), caps[2].trim().to_string());
    }

    if token_fallback {
        if let Some((token, rest)) = raw.split_once(' ') {
            let token = token.trim();
            let rest = rest.trim();
            if (1..=MAX_CATEGORY_CHARS).contains(&char_len(token)) && char_len(rest) >= 2 {
                return (Some(token.to_string()), rest.to_string());
            }
        }
    }

    (None, raw.to_string())
}

/// Shorten text to `max` graphemes, marking the cut with an ellipsis.
pub fn preview(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_lines_skips_blank_and_script() {
        let html = Html::parse_document(
            "<html><head><script>var x = 1;</script><style>p{}</style></head>\
             <body><div>  첫 줄 </div><div>\n</div><p>둘째<br>셋째</p></body></html>",
        );
        assert_eq!(flatten_lines(&html), vec!["첫 줄", "둘째", "셋째"]);
    }

    #[test]
    fn test_flatten_lines_splits_embedded_newlines() {
        let html = Html::parse_document("<pre>a\n\n  b  \nc</pre>");
        assert_eq!(flatten_lines(&html), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_joined_text_nested() {
        let html = Html::parse_fragment("<a><span>[질문]</span> <b>제목</b>\n</a>");
        let selector = scraper::Selector::parse("a").unwrap();
        let anchor = html.select(&selector).next().unwrap();
        assert_eq!(joined_text(&anchor), "[질문] 제목");
    }

    #[test]
    fn test_split_bracket_category() {
        assert_eq!(
            split_category("[질문] abc", false),
            (Some("질문".to_string()), "abc".to_string())
        );
        assert_eq!(
            split_category("[질문] abc", true),
            (Some("질문".to_string()), "abc".to_string())
        );
    }

    #[test]
    fn test_split_token_category() {
        assert_eq!(
            split_category("잡담 내용입니다", true),
            (Some("잡담".to_string()), "내용입니다".to_string())
        );
    }

    #[test]
    fn test_token_fallback_disabled() {
        assert_eq!(
            split_category("잡담 내용입니다", false),
            (None, "잡담 내용입니다".to_string())
        );
    }

    #[test]
    fn test_split_rejects_long_bracket_and_short_rest() {
        assert_eq!(
            split_category("[아주아주긴카테고리] 제목", false),
            (None, "[아주아주긴카테고리] 제목".to_string())
        );
        assert_eq!(split_category("잡담 a", true), (None, "잡담 a".to_string()));
        assert_eq!(
            split_category("일곱글자단어임 본문", true),
            (None, "일곱글자단어임 본문".to_string())
        );
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("가나다", 5), "가나다");
        assert_eq!(preview("가나다라마", 2), "가나…");
    }
}
