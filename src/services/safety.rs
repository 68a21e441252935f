//! Host and path safety rules.
//!
//! Detail pages are checked before any request is made. List pages are not
//! checked, but every anchor found on them is filtered through
//! [`SafetyGuard::is_disallowed`].

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::SafetySettings;

/// Allow-list of hosts plus deny-list of path patterns.
#[derive(Debug, Clone)]
pub struct SafetyGuard {
    allowed_hosts: Vec<String>,
    disallowed: Vec<Regex>,
}

impl SafetyGuard {
    /// Compile the guard from settings.
    pub fn new(settings: &SafetySettings) -> Result<Self> {
        let disallowed = settings
            .disallowed_paths
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    AppError::config(format!("invalid disallowed path '{pattern}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            allowed_hosts: settings
                .allowed_hosts
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
            disallowed,
        })
    }

    /// Add a host to the allow-list.
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into().to_lowercase());
        self
    }

    /// True if any disallowed pattern matches the path.
    pub fn is_disallowed(&self, path: &str) -> bool {
        self.disallowed.iter().any(|re| re.is_match(path))
    }

    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.allowed_hosts.iter().any(|allowed| *allowed == host)
    }

    /// Reject URLs on foreign hosts or disallowed paths. Never touches the network.
    pub fn assert_allowed(&self, url: &str) -> Result<()> {
        let parsed =
            Url::parse(url).map_err(|e| AppError::policy(format!("unparsable URL {url}: {e}")))?;

        let host = parsed.host_str().unwrap_or_default();
        if !self.is_allowed_host(host) {
            return Err(AppError::policy(format!("unexpected host: {host}")));
        }
        if self.is_disallowed(parsed.path()) {
            return Err(AppError::policy(format!(
                "disallowed path by safety rules: {}",
                parsed.path()
            )));
        }
        Ok(())
    }
}

impl Default for SafetyGuard {
    fn default() -> Self {
        Self::new(&SafetySettings::default()).expect("default safety rules compile")
    }
}
