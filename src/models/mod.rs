// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod layout;
mod post;
mod sentiment;

// Re-export all public types
pub use config::{
    BoardSettings, Config, DebugSettings, FetchConfig, HttpSettings, SafetySettings,
    SentimentSettings, SinkSettings,
};
pub use layout::{
    GENERIC_SCAN_WINDOW, Layout, LayoutRegistry, STRUCTURED_SCAN_WINDOW, StructuredLayout,
    TITLE_SCAN_WINDOW,
};
pub use post::{PostRecord, PostRef};
pub use sentiment::{AnalyzedPost, SentimentLabel, SentimentProbs, SentimentResult, TextUsed};
