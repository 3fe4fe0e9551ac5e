use thiserror::Error;

/// Failures that end processing of a single resource. None of these abort a
/// crawl: callers log them and move on to the next page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no content container #{container} in {url}")]
    MissingContentContainer { url: String, container: String },
}

impl ScrapeError {
    pub fn invalid_url(url: &str, source: url::ParseError) -> Self {
        ScrapeError::InvalidUrl {
            url: url.to_string(),
            source,
        }
    }
}
