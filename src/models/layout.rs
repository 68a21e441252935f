// src/models/layout.rs

//! Board layout variants and the registry that selects them.
//!
//! Boards on the site do not share markup. Most list pages put the title
//! straight into the post anchor, which the generic layout handles. Boards
//! registered here wrap the title in a "subject" element next to comment
//! counters and badges, so the anchor text is noise and only the selector
//! chain is trusted.

use std::collections::HashMap;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// How far into the flattened detail page the generic layout looks for metadata.
pub const GENERIC_SCAN_WINDOW: usize = 140;

/// How far into the flattened detail page the structured layout looks for metadata.
pub const STRUCTURED_SCAN_WINDOW: usize = 120;

/// Lines searched for the title when no timestamp anchors the body.
pub const TITLE_SCAN_WINDOW: usize = 90;

/// A registered board layout with its title selector chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuredLayout {
    /// Board this layout applies to
    pub board_id: u32,

    /// Name for logs
    #[serde(default = "default_layout_name")]
    pub name: String,

    /// CSS selectors tried in order inside each post anchor
    #[serde(default = "default_title_selectors")]
    pub title_selectors: Vec<String>,
}

fn default_layout_name() -> String {
    "subject".to_string()
}

fn default_title_selectors() -> Vec<String> {
    vec![
        "span.subject".into(),
        "div.subject".into(),
        "p.subject".into(),
        "strong.subject".into(),
        ".subject".into(),
    ]
}

impl StructuredLayout {
    /// Layout using the default subject selector chain.
    pub fn subject(board_id: u32) -> Self {
        Self {
            board_id,
            name: default_layout_name(),
            title_selectors: default_title_selectors(),
        }
    }

    /// Compile the selector chain.
    pub fn selectors(&self) -> Result<Vec<Selector>> {
        self.title_selectors
            .iter()
            .map(|s| Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}"))))
            .collect()
    }
}

/// Extraction strategy for one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Title from anchor text, heading re-read on the detail page, paginated.
    Generic,
    /// Title from a selector chain, list title authoritative, single page.
    Structured(StructuredLayout),
}

impl Layout {
    pub fn name(&self) -> &str {
        match self {
            Layout::Generic => "generic",
            Layout::Structured(layout) => &layout.name,
        }
    }

    /// Number of leading lines scanned for timestamp and author.
    pub fn scan_window(&self) -> usize {
        match self {
            Layout::Generic => GENERIC_SCAN_WINDOW,
            Layout::Structured(_) => STRUCTURED_SCAN_WINDOW,
        }
    }

    /// Whether list pages beyond the first are requested.
    pub fn paginates(&self) -> bool {
        matches!(self, Layout::Generic)
    }

    /// Whether the detail page heading overrides the list title.
    pub fn trusts_detail_heading(&self) -> bool {
        matches!(self, Layout::Generic)
    }
}

/// Explicit board id to layout mapping. Unknown boards are generic.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: HashMap<u32, StructuredLayout>,
}

impl LayoutRegistry {
    /// Empty registry; every board resolves to the generic layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the boards known to use subject markup.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for board_id in defaults::STRUCTURED_BOARDS {
            registry.register(StructuredLayout::subject(*board_id));
        }
        registry
    }

    /// Add or replace a board layout.
    pub fn register(&mut self, layout: StructuredLayout) {
        self.layouts.insert(layout.board_id, layout);
    }

    /// Resolve the layout for a board.
    pub fn layout_for(&self, board_id: u32) -> Layout {
        self.layouts
            .get(&board_id)
            .cloned()
            .map_or(Layout::Generic, Layout::Structured)
    }

    /// Check that every registered selector compiles.
    pub fn validate(&self) -> Result<()> {
        for layout in self.layouts.values() {
            if layout.title_selectors.is_empty() {
                return Err(AppError::config(format!(
                    "layout '{}' for board {} has no title selectors",
                    layout.name, layout.board_id
                )));
            }
            layout
                .selectors()
                .map_err(|e| AppError::config(e.to_string()))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

mod defaults {
    /// Lost Ark boards rendered with the subject list template.
    pub const STRUCTURED_BOARDS: &[u32] = &[6271];
}
