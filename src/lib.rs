// src/lib.rs

//! Inven board crawler library.
//!
//! Fetches board list pages politely, extracts post references and post
//! details with layout-aware heuristics, and hands the posts to sentiment
//! scoring and publishing.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
