/* src/upstream.rs */

use crate::{
    error::ResolveError,
    payload::Payload,
    ratelimit::RateGate,
    transport::{Transport, TransportError},
};
use fancy_log::{LogLevel, log};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT_VALUE: &str = concat!("blockgate/", env!("CARGO_PKG_VERSION"));

/// Upstream base URLs in priority order (first = most preferred).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamList(Vec<String>);

impl UpstreamList {
    pub fn new<I, S>(bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            bases
                .into_iter()
                .filter_map(|base| {
                    let base = base.as_ref().trim().trim_end_matches('/');
                    (!base.is_empty()).then(|| base.to_owned())
                })
                .collect(),
        )
    }

    /// Parses a comma separated list, dropping blanks and trailing slashes.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why a single upstream candidate could not be used.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("responded with status {0}")]
    Rejected(u16),
    #[error("declared JSON but body did not parse: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Tries each upstream in order and returns the first 200 response.
pub struct UpstreamFetcher {
    upstreams: UpstreamList,
    transport: Arc<dyn Transport>,
    gate: Arc<RateGate>,
    timeout: Duration,
    headers: HeaderMap,
}

impl UpstreamFetcher {
    pub fn new(
        upstreams: UpstreamList,
        transport: Arc<dyn Transport>,
        gate: Arc<RateGate>,
        timeout: Duration,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        Self {
            upstreams,
            transport,
            gate,
            timeout,
            headers,
        }
    }

    /// Fetches `path` from the first upstream that answers with status 200.
    ///
    /// `path` is appended verbatim to each base URL, so any user supplied
    /// segment must already be escaped.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidPath`] if `path` does not start with `/`
    /// - [`ResolveError::UpstreamsExhausted`] when every candidate failed,
    ///   including the case of an empty upstream list
    pub async fn fetch(&self, path: &str) -> Result<Payload, ResolveError> {
        if !path.starts_with('/') {
            return Err(ResolveError::InvalidPath(path.to_owned()));
        }

        for base in self.upstreams.iter() {
            let url = format!("{base}{path}");

            match self.attempt(&url).await {
                Ok(payload) => {
                    log(LogLevel::Debug, &format!("Fetched {url}"));
                    return Ok(payload);
                }
                Err(AttemptFailure::Rejected(status)) => {
                    log(
                        LogLevel::Debug,
                        &format!("Upstream {url} responded with {status}. Trying next upstream."),
                    );
                }
                Err(failure) => {
                    log(
                        LogLevel::Warn,
                        &format!("Upstream {url} failed: {failure}. Trying next upstream."),
                    );
                }
            }
        }

        log(
            LogLevel::Error,
            &format!(
                "All {} upstream(s) failed for {path}",
                self.upstreams.len()
            ),
        );
        Err(ResolveError::UpstreamsExhausted {
            attempted: self.upstreams.len(),
        })
    }

    async fn attempt(&self, url: &str) -> Result<Payload, AttemptFailure> {
        self.gate.acquire().await;

        let response = tokio::time::timeout(
            self.timeout,
            self.transport.get(url, &self.headers, self.timeout),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.timeout))??;

        if response.status != 200 {
            return Err(AttemptFailure::Rejected(response.status));
        }

        Ok(Payload::decode(&response.content_type, response.body)?)
    }
}
