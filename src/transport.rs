/* src/transport.rs */

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, header::HeaderMap};
use std::time::Duration;
use thiserror::Error;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// The single uniform failure of an outbound call: the upstream is unusable
/// right now.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// Performs one GET against a fully formed URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport used in production.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .use_rustls_tls()
            .tcp_nodelay(true)
            .build()
            .map_err(|e| TransportError::Request(format!("HTTP client build failed: {e}")))?;

        Ok(Self { client })
    }

    fn classify(error: &reqwest::Error, timeout: Duration) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(timeout)
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(&e, timeout))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(&e, timeout))?;

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// What a scripted upstream URL does when called.
    #[derive(Clone)]
    pub(crate) enum Reply {
        Respond(TransportResponse),
        Fail(TransportError),
        /// Never answers; only the caller's timeout ends the call.
        Hang,
    }

    /// Answers by exact URL and records every call made to it.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn with(mut self, url: &str, reply: Reply) -> Self {
            self.replies.insert(url.to_owned(), reply);
            self
        }

        pub(crate) fn json(self, url: &str, body: &str) -> Self {
            self.with(
                url,
                Reply::Respond(TransportResponse::new(200, "application/json", body)),
            )
        }

        pub(crate) fn text(self, url: &str, body: &str) -> Self {
            self.with(
                url,
                Reply::Respond(TransportResponse::new(200, "text/plain", body)),
            )
        }

        pub(crate) fn status(self, url: &str, status: u16) -> Self {
            self.with(
                url,
                Reply::Respond(TransportResponse::new(status, "text/plain", "error")),
            )
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            url: &str,
            _headers: &HeaderMap,
            _timeout: Duration,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.lock().unwrap().push(url.to_owned());
            let reply = self.replies.get(url).cloned().unwrap_or_else(|| {
                Reply::Fail(TransportError::Connect(format!("no route to {url}")))
            });

            match reply {
                Reply::Respond(response) => Ok(response),
                Reply::Fail(error) => Err(error),
                Reply::Hang => std::future::pending().await,
            }
        }
    }
}
