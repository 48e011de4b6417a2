use thiserror::Error;

/// Failures talking to the backend. Poll and submit round trips both land
/// here; callers log them and keep showing last-known-good state.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("bad base url: {0}")]
    Url(#[from] url::ParseError),
}

/// Rejected store mutations. These indicate caller bugs, not runtime
/// conditions, and are never surfaced to the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("message is missing text, sender, or conversation id")]
    InvalidMessage,
    #[error("message id {0} already present in conversation")]
    DuplicateId(String),
    #[error("unknown conversation {0}")]
    UnknownConversation(String),
}

/// Rejected sends. `EmptyMessage` is a local no-op; no network call happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("refusing to send empty message")]
    EmptyMessage,
    #[error("no conversation selected")]
    NoSelection,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory on this system")]
    NoConfigDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
