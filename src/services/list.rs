// src/services/list.rs

//! Board list page extraction.
//!
//! Every `a[href]` on the page is a candidate. An anchor becomes a
//! [`PostRef`] when its resolved path is `/board/<game>/<board_id>/<digits>`,
//! the path is not disallowed, and a title can be derived from it.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Layout, PostRef};
use crate::services::SafetyGuard;
use crate::utils::text::{joined_text, split_category};
use crate::utils::url::resolve;

/// Parses list pages of one board.
#[derive(Debug)]
pub struct ListExtractor {
    board_id: u32,
    base_url: Url,
    post_path: Regex,
    layout: Layout,
    title_selectors: Vec<Selector>,
    anchor_selector: Selector,
}

impl ListExtractor {
    /// Create an extractor for `board_id`, resolving hrefs against `base_url`.
    pub fn new(board_id: u32, base_url: &str, layout: Layout) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let post_path = Regex::new(&format!(r"^/board/[^/]+/{board_id}/(\d+)$"))
            .map_err(|e| AppError::config(format!("post path pattern: {e}")))?;
        let title_selectors = match &layout {
            Layout::Generic => Vec::new(),
            Layout::Structured(structured) => structured.selectors()?,
        };

        Ok(Self {
            board_id,
            base_url,
            post_path,
            layout,
            title_selectors,
            anchor_selector: parse_selector("a[href]")?,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Extract post references, de-duplicated by post id, in page order.
    pub fn parse(&self, html: &str, guard: &SafetyGuard) -> Vec<PostRef> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut refs = Vec::new();

        for anchor in document.select(&self.anchor_selector) {
            let Some(post_ref) = self.parse_anchor(&anchor, guard) else {
                continue;
            };
            if seen.insert(post_ref.post_id) {
                refs.push(post_ref);
            }
        }

        refs
    }

    fn parse_anchor(&self, anchor: &ElementRef<'_>, guard: &SafetyGuard) -> Option<PostRef> {
        let href = anchor.value().attr("href")?;
        let url = resolve(&self.base_url, href)?;
        let path = url.path();

        let post_id = self
            .post_path
            .captures(path)?
            .get(1)?
            .as_str()
            .parse::<u64>()
            .ok()?;

        if guard.is_disallowed(path) {
            return None;
        }

        let raw_title = self.title_for(anchor)?;
        let (category, title) =
            split_category(&raw_title, matches!(self.layout, Layout::Generic));
        if title.is_empty() {
            return None;
        }

        Some(PostRef {
            board_id: self.board_id,
            post_id,
            url: url.to_string(),
            title,
            category,
        })
    }

    fn title_for(&self, anchor: &ElementRef<'_>) -> Option<String> {
        match self.layout {
            Layout::Generic => Some(joined_text(anchor)).filter(|t| !t.is_empty()),
            Layout::Structured(_) => self.title_selectors.iter().find_map(|selector| {
                anchor
                    .select(selector)
                    .map(|el| joined_text(&el))
                    .find(|t| !t.is_empty())
            }),
        }
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
