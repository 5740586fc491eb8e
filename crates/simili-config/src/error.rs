use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, merging, or validating a policy.
///
/// Every variant is fatal to the run: no partial policy is ever returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config document {origin} is not valid UTF-8")]
    NotUtf8 { origin: String },
    #[error("failed to parse config document {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid extends reference '{reference}': {reason}")]
    InvalidExtendsRef {
        reference: String,
        reason: &'static str,
    },
    #[error("failed to fetch extended config {reference}")]
    Fetch {
        reference: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("extends chain exceeded maximum depth of {max_depth} at {reference}")]
    ExtendsDepthExceeded { max_depth: usize, reference: String },
    #[error("extends chain revisits {reference}")]
    ExtendsCycle { reference: String },
    #[error("missing required configuration: {}", fields.join(", "))]
    MissingRequired { fields: Vec<&'static str> },
    #[error("invalid configuration: {}", problems.join("; "))]
    InvalidValues { problems: Vec<String> },
}
