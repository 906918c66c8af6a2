//! Project Gutenberg Client
//!
//! Downloads plain-text books from the Project Gutenberg cache mirror.
//!
//! # Architecture
//! Every attempt runs under the policy's per-attempt timeout. Server errors,
//! timeouts and connection failures retry with doubling backoff up to the
//! policy's retry count; client errors (4xx) fail immediately.
//!
//! # API Reference
//! - Endpoint: https://www.gutenberg.org/cache/epub/{id}/pg{id}.txt

use crate::error::FetchError;
use crate::types::RawBookText;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};
use reqwest::{header, Client};
use tracing::{debug, info};

/// Gutenberg cache mirror base URL
pub const GUTENBERG_BASE_URL: &str = "https://www.gutenberg.org";

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("gutenku/", env!("CARGO_PKG_VERSION"));

pub struct GutenbergClient {
    /// HTTP client for book downloads
    http_client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl GutenbergClient {
    pub fn new(policy: RetryPolicy) -> Result<Self, FetchError> {
        Self::with_base_url(GUTENBERG_BASE_URL, policy)
    }

    /// Client against a mirror or test server
    pub fn with_base_url(base_url: &str, policy: RetryPolicy) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

        let http_client = Client::builder()
            .timeout(policy.attempt_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network {
                book_id: 0,
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        })
    }

    pub fn book_url(&self, book_id: i64) -> String {
        format!("{}/cache/epub/{book_id}/pg{book_id}.txt", self.base_url)
    }

    async fn fetch_once(&self, book_id: i64) -> Result<String, FetchError> {
        let url = self.book_url(book_id);
        debug!(book_id, url = %url, "Requesting book text");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { book_id }
            } else {
                FetchError::Network {
                    book_id,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                book_id,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { book_id }
            } else {
                FetchError::Network {
                    book_id,
                    message: e.to_string(),
                }
            }
        })
    }

    /// Download book `book_id`, retrying transient failures
    pub async fn fetch_book(&self, book_id: i64) -> Result<RawBookText, FetchError> {
        let operation = format!("fetch book {book_id}");
        let content = retry_with_backoff(
            &operation,
            &self.policy,
            || self.fetch_once(book_id),
            FetchError::is_retryable,
        )
        .await?;

        let book = RawBookText::new(content, book_id)
            .map_err(|source| FetchError::InvalidContent { book_id, source })?;
        info!(book_id, chars = book.content().len(), "Fetched book");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_url() {
        let client = GutenbergClient::new(RetryPolicy::default()).unwrap();
        assert_eq!(
            client.book_url(1342),
            "https://www.gutenberg.org/cache/epub/1342/pg1342.txt"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client =
            GutenbergClient::with_base_url("http://mirror.local/", RetryPolicy::default()).unwrap();
        assert_eq!(client.book_url(7), "http://mirror.local/cache/epub/7/pg7.txt");
    }

    /// Local address that refuses connections: bound, then released
    fn closed_local_addr() -> std::net::SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_after_retries() {
        let policy = RetryPolicy {
            max_retries: 1,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            attempt_timeout_secs: 2,
        };
        let base_url = format!("http://{}", closed_local_addr());
        let client = GutenbergClient::with_base_url(&base_url, policy).unwrap();
        let err = client.fetch_book(1).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
