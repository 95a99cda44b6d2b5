//! Error types for snapshot acquisition, identity resolution and graph construction.

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the construction of a graph snapshot.
///
/// A failed build never yields a partially populated graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not fetch topology feed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("server {0} cannot peer with itself")]
    SelfLoop(String),
}

/// The input didn't have the expected shape. The whole batch is rejected.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("malformed topology feed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0:?} does not match any known MAP format")]
    MapLine(String),

    #[error("link references unknown server id {0:?}")]
    UnknownLinkId(String),
}

/// Failure to map a server name to its id. Graph builds treat every variant as "unresolvable".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("timed out resolving {0:?}")]
    Timeout(String),

    #[error("no such server {0:?}")]
    NoSuchServer(String),

    #[error("could not send lookup: {0}")]
    Transport(String),

    #[error("resolver dropped the request for {0:?}")]
    Closed(String),
}

/// Failure to collect a `MAP` + `LINKS` snapshot from the live network.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    #[error("snapshot acquisition already in progress")]
    InProgress,

    #[error("timed out waiting for the end of {0}")]
    Timeout(&'static str),

    #[error("{0} stream closed before its end marker")]
    Interrupted(&'static str),
}
