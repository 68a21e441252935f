// src/config.rs

//! Configuration loading utilities.
//!
//! Configuration is read once at startup: the TOML file (if any) provides
//! the base, environment variables override individual fields, and the
//! result is validated before anything touches the network.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::models::{Config, TextUsed};

/// Load, override from the process environment, and validate.
///
/// A missing file falls back to defaults with a warning. A file that
/// cannot be read or parsed is a configuration error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_or_default(path)?,
        None => Config::default(),
    };
    apply_env(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;

    log::debug!(
        "Config loaded: board={} base_url={} max_pages={} max_posts={}",
        config.board.id,
        config.board.base_url,
        config.board.max_list_pages,
        config.board.max_posts_per_run
    );
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Unset or blank variables leave the field untouched. A set but
/// unparsable variable is a configuration error.
pub fn apply_env<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    // Board
    if let Some(v) = get("INVEN_BOARD_ID") {
        config.board.id = parse("INVEN_BOARD_ID", &v)?;
    }
    if let Some(v) = get("INVEN_BOARD_BASE_URL") {
        config.board.base_url = v;
    }
    if let Some(v) = get("INVEN_MAX_LIST_PAGES") {
        config.board.max_list_pages = parse("INVEN_MAX_LIST_PAGES", &v)?;
    }
    if let Some(v) = get("INVEN_MAX_POSTS_PER_RUN") {
        config.board.max_posts_per_run = parse("INVEN_MAX_POSTS_PER_RUN", &v)?;
    }

    // HTTP
    if let Some(v) = get("INVEN_REQUEST_TIMEOUT_SEC") {
        config.http.timeout_secs = parse("INVEN_REQUEST_TIMEOUT_SEC", &v)?;
    }
    if let Some(v) = get("INVEN_REQUEST_DELAY_SEC") {
        config.http.delay_secs = parse("INVEN_REQUEST_DELAY_SEC", &v)?;
    }
    if let Some(v) = get("INVEN_MAX_RETRIES") {
        config.http.max_retries = parse("INVEN_MAX_RETRIES", &v)?;
    }
    if let Some(v) = get("INVEN_BACKOFF_BASE_SEC") {
        config.http.backoff_base_secs = parse("INVEN_BACKOFF_BASE_SEC", &v)?;
    }
    if let Some(v) = get("INVEN_BACKOFF_MAX_SEC") {
        config.http.backoff_max_secs = parse("INVEN_BACKOFF_MAX_SEC", &v)?;
    }
    if let Some(v) = get("INVEN_USER_AGENT") {
        config.http.user_agent = v;
    }

    // Debug
    if let Some(v) = get("INVEN_DUMP_HTML_ON_EMPTY") {
        config.debug.dump_html_on_empty = parse_bool("INVEN_DUMP_HTML_ON_EMPTY", &v)?;
    }
    if let Some(v) = get("INVEN_DUMP_HTML_PATH") {
        config.debug.dump_html_path = PathBuf::from(v);
    }

    // Sentiment
    if let Some(v) = get("SENTIMENT_ENDPOINT") {
        config.sentiment.endpoint = v;
    }
    if let Some(v) = get("SENTIMENT_MODEL_VERSION") {
        config.sentiment.model_version = v;
    }
    if let Some(v) = get("SENTIMENT_TEXT_USED") {
        config.sentiment.text_used = TextUsed::parse(&v).ok_or_else(|| {
            AppError::config(format!(
                "SENTIMENT_TEXT_USED must be 'title' or 'title+content', got '{v}'"
            ))
        })?;
    }
    if let Some(v) = get("SENTIMENT_BATCH_SIZE") {
        config.sentiment.batch_size = parse("SENTIMENT_BATCH_SIZE", &v)?;
    }
    if let Some(v) = get("SENTIMENT_MAX_LENGTH") {
        config.sentiment.max_length = parse("SENTIMENT_MAX_LENGTH", &v)?;
    }
    if let Some(v) = get("SENTIMENT_NEUTRAL_FLOOR") {
        config.sentiment.neutral_floor = parse("SENTIMENT_NEUTRAL_FLOOR", &v)?;
    }

    // Sink
    if let Some(v) = get("SINK_PATH") {
        config.sink.path = PathBuf::from(v);
    }

    Ok(())
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| AppError::config(format!("{key}='{value}' is invalid: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::config(format!(
            "{key}='{value}' is not a boolean"
        ))),
    }
}
