use thiserror::Error;

/// Errors surfaced by the cache's configuration and key-building helpers.
///
/// Bookkeeping operations (`get`, `set`, invalidation, eviction, optimistic
/// updates) never fail; only building keys from arbitrary serializable
/// parameters and loading settings can.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to serialize request parameters: {0}")]
    KeySerialization(#[from] serde_json::Error),

    #[error("failed to read cache settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse cache settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("invalid cache policy for `{resource}`: {reason}")]
    InvalidPolicy { resource: String, reason: String },

    #[error("invalid cache settings for `{key}`: {reason}")]
    InvalidSettings { key: &'static str, reason: String },

    #[error("unknown resource type `{0}`")]
    UnknownResource(String),

    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),
}
