use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::settings::Settings;

/// Source of raw page markup.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<String, ScrapeError>;
}

/// Keeps at least `delay` between the end of one fetch and the start of the
/// next. The first fetch is never delayed.
pub struct Throttle {
    delay: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Throttle { delay, last: None }
    }

    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let remaining = self.delay.saturating_sub(last.elapsed());
            if !remaining.is_zero() {
                debug!("Throttling for {:.2}s", remaining.as_secs_f64());
                thread::sleep(remaining);
            }
        }
    }

    pub fn mark(&mut self) {
        self.last = Some(Instant::now());
    }
}

/// Blocking HTTP fetcher with browser-like headers. No retries: any
/// transport error or non-2xx status is returned to the caller.
pub struct HttpFetcher {
    client: Client,
    throttle: Throttle,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(HttpFetcher {
            client,
            throttle: Throttle::new(Duration::from_millis(settings.delay_ms)),
        })
    }

    fn get(&self, url: &str) -> Result<String, ScrapeError> {
        let request_error = |source| ScrapeError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(request_error)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, ScrapeError> {
        self.throttle.wait();
        info!("Fetching {}", url);
        let result = self.get(url);
        self.throttle.mark();
        result
    }
}
