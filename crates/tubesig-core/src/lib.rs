//! Shared record types, JSON file I/O and configuration for tubesig.
//!
//! Every pipeline step reads and writes the same two record shapes:
//! [`Signal`] lists and [`ReviewSet`] maps. Keeping them here gives the
//! steps one data contract instead of "this JSON file has these keys".

pub mod app_config;
pub mod config;
pub mod io;
pub mod review;
pub mod signal;
pub mod watchlist;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use io::{
    read_json, read_reviews, read_signals, write_atomic, write_json, write_reviews, write_signals,
};
pub use review::{Review, ReviewSet, ReviewStatus};
pub use signal::{Confidence, Signal, SignalType};
pub use watchlist::{load_watchlist, Watchlist};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read watchlist file {path}: {source}")]
    WatchlistIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse watchlist file: {0}")]
    WatchlistParse(#[source] serde_yaml::Error),

    #[error("watchlist validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
