use thiserror::Error;

/// Everything a scrape call can fail with.
///
/// The pipeline never retries and never turns one kind into another, so a
/// caller can match on the variant to decide between skipping, retrying and
/// flagging the adapter for an update.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The identifier has no such resource (the title is missing).
    #[error("not found: {0}")]
    NotFound(String),

    /// An inline-script token the follow-up request needs is gone.
    #[error("site markup changed: {0}")]
    Protocol(String),

    /// A release row lost one of its cells.
    #[error("malformed release row: {0}")]
    MalformedRow(String),

    /// Network failure, timeout or a 4xx/5xx answer.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScrapeError::Transport(format!("timed out: {e}"))
        } else {
            ScrapeError::Transport(e.to_string())
        }
    }
}

/// Raised while compiling a site adapter, never during a scrape.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{0}` has no capture group")]
    PatternWithoutCapture(String),

    #[error("invalid base url `{url}`: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base url is not a valid header value: {0}")]
    Header(String),

    #[error("field table has no required title rule")]
    MissingTitle,

    #[error("field `{0}` appears more than once")]
    DuplicateField(&'static str),

    #[error("floor range {0}..={1} is empty")]
    EmptyFloorRange(u32, u32),
}
