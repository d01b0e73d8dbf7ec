//! Disclosure watchlist loaded from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Filters applied before a disclosure is forwarded to the chat bot.
///
/// An empty watchlist forwards everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    /// Case-insensitive substrings matched against company and report names.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Exact issuer codes.
    #[serde(default)]
    pub corp_codes: Vec<String>,
    /// Case-insensitive substrings that veto a match.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Watchlist {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.corp_codes.is_empty()
    }
}

/// Load and validate the watchlist. A missing file yields an empty watchlist.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_watchlist(path: &Path) -> Result<Watchlist, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no watchlist file; forwarding all disclosures");
        return Ok(Watchlist::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WatchlistIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_watchlist(&content)
}

/// Parse and validate watchlist YAML.
///
/// # Errors
///
/// Returns `ConfigError` on malformed YAML or blank entries.
pub fn parse_watchlist(content: &str) -> Result<Watchlist, ConfigError> {
    // An empty document deserializes as unit, not a mapping.
    if content.trim().is_empty() {
        return Ok(Watchlist::default());
    }

    let watchlist: Watchlist =
        serde_yaml::from_str(content).map_err(ConfigError::WatchlistParse)?;

    validate_watchlist(&watchlist)?;

    Ok(watchlist)
}

fn validate_watchlist(watchlist: &Watchlist) -> Result<(), ConfigError> {
    let lists = [
        ("keywords", &watchlist.keywords),
        ("corp_codes", &watchlist.corp_codes),
        ("exclude", &watchlist.exclude),
    ];

    for (name, entries) in lists {
        if entries.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{name} must not contain empty entries"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_lists() {
        let yaml = "keywords:\n  - 유상증자\n  - merger\ncorp_codes:\n  - \"00126380\"\nexclude:\n  - 정정\n";
        let wl = parse_watchlist(yaml).unwrap();
        assert_eq!(wl.keywords, vec!["유상증자", "merger"]);
        assert_eq!(wl.corp_codes, vec!["00126380"]);
        assert_eq!(wl.exclude, vec!["정정"]);
        assert!(!wl.is_empty());
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let wl = parse_watchlist("keywords: [buyback]\n").unwrap();
        assert!(wl.corp_codes.is_empty());
        assert!(wl.exclude.is_empty());
    }

    #[test]
    fn empty_document_is_empty_watchlist() {
        assert!(parse_watchlist("  \n").unwrap().is_empty());
    }

    #[test]
    fn blank_entry_fails_validation() {
        let err = parse_watchlist("keywords: [\"  \"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("keywords")));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse_watchlist("keywords: [unterminated\n").unwrap_err();
        assert!(matches!(err, ConfigError::WatchlistParse(_)));
    }

    #[test]
    fn missing_file_yields_empty_watchlist() {
        let dir = tempfile::tempdir().unwrap();
        let wl = load_watchlist(&dir.path().join("absent.yaml")).unwrap();
        assert!(wl.is_empty());
    }
}
