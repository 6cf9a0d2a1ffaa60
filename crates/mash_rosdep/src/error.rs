//! Error types for rosdep and rosdistro operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosdepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to download from URL: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Failed to download from URL: {0}")]
    DownloadMiddleware(#[from] reqwest_middleware::Error),

    #[error("Invalid location {0}")]
    InvalidLocation(String),

    #[error("Failed to parse {location}: {source}")]
    Yaml {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no rosdep rule for key \"{0}\"")]
    UnknownKey(String),

    #[error("rosdep key \"{key}\" has no rule for {os_name}")]
    UnsupportedOs { key: String, os_name: String },

    #[error("rosdep key \"{key}\" has an invalid rule for {os_name}")]
    InvalidRule { key: String, os_name: String },

    #[error("distribution \"{distro}\" is not part of the rosdistro index {index}")]
    UnknownDistro { distro: String, index: String },
}
