// src/services/board.rs

//! Board crawler service.
//!
//! Walks list pages into post references, then fetches each post detail
//! page one at a time. Pagination stops at the first empty page; per-post
//! failures are logged and skipped so one bad post never sinks the batch.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{Config, Layout, PostRecord, PostRef};
use crate::services::{DetailExtractor, ListExtractor, SafetyGuard};
use crate::utils::PageSource;
use crate::utils::url::list_page_url;

/// Crawls one board through a [`PageSource`].
pub struct BoardCrawler<S> {
    source: S,
    base_url: String,
    guard: SafetyGuard,
    list: ListExtractor,
    detail: DetailExtractor,
    dump_path: Option<PathBuf>,
}

impl<S: PageSource> BoardCrawler<S> {
    /// Create a crawler for `board_id` whose first list page is `base_url`.
    pub fn new(
        source: S,
        board_id: u32,
        base_url: impl Into<String>,
        layout: Layout,
        guard: SafetyGuard,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let list = ListExtractor::new(board_id, &base_url, layout.clone())?;
        let detail = DetailExtractor::new(layout)?;

        Ok(Self {
            source,
            base_url,
            guard,
            list,
            detail,
            dump_path: None,
        })
    }

    /// Create a crawler for the configured board, layout and safety rules.
    pub fn from_config(source: S, config: &Config) -> Result<Self> {
        let layout = config.layout_registry().layout_for(config.board.id);
        let guard = SafetyGuard::new(&config.safety)?;
        log::debug!(
            "Board {} uses layout '{}'",
            config.board.id,
            layout.name()
        );

        Ok(Self::new(source, config.board.id, &config.board.base_url, layout, guard)?
            .with_dump_path(config.dump_path()))
    }

    /// Write the first list page here when it yields no posts.
    pub fn with_dump_path(mut self, path: Option<PathBuf>) -> Self {
        self.dump_path = path;
        self
    }

    pub fn layout(&self) -> &Layout {
        self.list.layout()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch raw list page HTML.
    pub async fn fetch_list_html(&self, page: usize) -> Result<String> {
        let url = list_page_url(&self.base_url, page)?;
        log::info!("Fetching board list: url={}", url);
        self.source.get_text(&url).await
    }

    /// Parse list page HTML into references.
    pub fn parse_list(&self, html: &str) -> Vec<PostRef> {
        self.list.parse(html, &self.guard)
    }

    /// Collect up to `max_posts` references, first occurrence of a post id wins.
    ///
    /// The generic layout reads pages `1..=max_pages` and stops early at an
    /// empty page. Single-page layouts read the base URL once and ignore
    /// `max_pages`. Page fetch errors propagate.
    pub async fn fetch_refs(&self, max_pages: usize, max_posts: usize) -> Result<Vec<PostRef>> {
        if max_posts == 0 {
            return Ok(Vec::new());
        }

        if !self.layout().paginates() {
            let html = self.fetch_list_html(1).await?;
            let mut refs = self.parse_list_page(1, &html).await;
            refs.truncate(max_posts);
            return Ok(refs);
        }

        let mut seen = HashSet::new();
        let mut collected = Vec::new();

        for page in 1..=max_pages {
            let html = self.fetch_list_html(page).await?;
            let refs = self.parse_list_page(page, &html).await;

            if refs.is_empty() {
                log::info!("No post refs found on page={}; stopping pagination.", page);
                break;
            }

            for post_ref in refs {
                if seen.insert(post_ref.post_id) {
                    collected.push(post_ref);
                    if collected.len() >= max_posts {
                        return Ok(collected);
                    }
                }
            }
        }

        Ok(collected)
    }

    /// Fetch and parse one post. Disallowed URLs fail before any request.
    pub async fn fetch_post(&self, post_ref: &PostRef) -> Result<PostRecord> {
        self.guard.assert_allowed(&post_ref.url)?;

        log::info!(
            "Fetching post: post_id={} url={}",
            post_ref.post_id,
            post_ref.url
        );
        let html = self.source.get_text(&post_ref.url).await?;
        self.detail.parse(&html, post_ref)
    }

    /// Fetch posts sequentially in input order, skipping failures.
    pub async fn fetch_posts(&self, refs: &[PostRef]) -> Vec<PostRecord> {
        let mut posts = Vec::with_capacity(refs.len());
        let mut failures = 0usize;

        for post_ref in refs {
            match self.fetch_post(post_ref).await {
                Ok(post) => posts.push(post),
                Err(error) => {
                    failures += 1;
                    log::warn!(
                        "Skipping post due to error: post_id={} err={}",
                        post_ref.post_id,
                        error
                    );
                }
            }
        }

        if failures > 0 {
            log::warn!("Fetched {} posts, skipped {}", posts.len(), failures);
        }
        posts
    }

    async fn parse_list_page(&self, page: usize, html: &str) -> Vec<PostRef> {
        let refs = self.parse_list(html);
        if refs.is_empty() && page == 1 {
            self.dump_empty_page(html).await;
        }
        refs
    }

    async fn dump_empty_page(&self, html: &str) {
        let Some(path) = &self.dump_path else {
            return;
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::warn!("Could not create dump directory {}: {}", parent.display(), e);
                return;
            }
        }
        match tokio::fs::write(path, html).await {
            Ok(()) => log::warn!("No refs parsed. Dumped HTML to: {}", path.display()),
            Err(e) => log::warn!("No refs parsed. HTML dump to {} failed: {}", path.display(), e),
        }
    }
}
