//! Client for the external video search/listing API.
//!
//! The upstream is treated as an opaque, partially unreliable collaborator:
//! every request is bounded by a timeout, failures are classified rather
//! than retried, and payloads are only trusted as far as the `data.videos`
//! array they may or may not contain.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Bound on every upstream call. On expiry the request fails with
/// [`UpstreamError::Timeout`] instead of hanging.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_millis(8000);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream rate limit exceeded")]
    RateLimited,

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("upstream transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

pub struct UpstreamClient {
    http: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, UPSTREAM_TIMEOUT)
    }

    /// Same as [`UpstreamClient::new`] with an explicit timeout, so tests can
    /// exercise timeout classification without waiting the full 8 seconds.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("building upstream HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Keyword search. Returns `Ok(None)` when the response carried no
    /// recognizable video list; callers turn that into an empty result, not
    /// an error.
    pub async fn search(
        &self,
        query: &str,
        quality: &str,
    ) -> std::result::Result<Option<Vec<Value>>, UpstreamError> {
        let hd = if quality == "high" { "1" } else { "0" };
        let url = format!("{}/api/feed/search", self.base_url);
        let request = self.http.get(&url).query(&[("keywords", query), ("hd", hd)]);
        self.fetch_videos(request).await
    }

    /// Trending feed.
    pub async fn trending(&self) -> std::result::Result<Option<Vec<Value>>, UpstreamError> {
        let url = format!("{}/api/feed/list", self.base_url);
        let request = self.http.get(&url).query(&[("hd", "1")]);
        self.fetch_videos(request).await
    }

    async fn fetch_videos(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<Option<Vec<Value>>, UpstreamError> {
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        // A 200 with a body we cannot parse is a malformed payload, which is
        // the same as "no videos" rather than a failure.
        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(err) if err.is_timeout() => return Err(UpstreamError::Timeout),
            Err(err) => {
                log::debug!("discarding malformed upstream payload: {err}");
                return Ok(None);
            }
        };

        Ok(payload
            .get("data")
            .and_then(|data| data.get("videos"))
            .and_then(Value::as_array)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn search_extracts_the_video_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/feed/search")
            .match_query(mockito::Matcher::UrlEncoded(
                "keywords".into(),
                "mèo".into(),
            ))
            .with_header("content-type", "application/json")
            .with_body(
                json!({"data": {"videos": [{"video_id": "1", "play": "u"}]}}).to_string(),
            )
            .create_async()
            .await;

        let client = UpstreamClient::new(server.url()).unwrap();
        let videos = client.search("mèo", "high").await.unwrap().unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0]["video_id"], "1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_video_list_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/feed/list")
            .match_query(mockito::Matcher::Any)
            .with_body(json!({"data": {"cursor": 3}}).to_string())
            .create_async()
            .await;

        let client = UpstreamClient::new(server.url()).unwrap();
        assert!(client.trending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unparseable_body_is_treated_as_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/feed/list")
            .match_query(mockito::Matcher::Any)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = UpstreamClient::new(server.url()).unwrap();
        assert!(client.trending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn http_429_classifies_as_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/feed/search")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let client = UpstreamClient::new(server.url()).unwrap();
        let err = client.search("cats", "low").await.unwrap_err();
        assert!(matches!(err, UpstreamError::RateLimited));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_as_is() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/feed/search")
            .match_query(mockito::Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let client = UpstreamClient::new(server.url()).unwrap();
        let err = client.search("cats", "low").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status(502)));
    }

    #[tokio::test]
    async fn slow_upstream_classifies_as_timeout() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/feed/search")
            .match_query(mockito::Matcher::Any)
            .with_chunked_body(|writer| {
                std::thread::sleep(Duration::from_millis(500));
                writer.write_all(b"{}")
            })
            .create_async()
            .await;

        let client =
            UpstreamClient::with_timeout(server.url(), Duration::from_millis(100)).unwrap();
        let err = client.search("cats", "low").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout));
    }

    #[tokio::test]
    async fn low_quality_requests_hd_zero() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/feed/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("keywords".into(), "q".into()),
                mockito::Matcher::UrlEncoded("hd".into(), "0".into()),
            ]))
            .with_body(json!({"data": {"videos": []}}).to_string())
            .create_async()
            .await;

        let client = UpstreamClient::new(server.url()).unwrap();
        let videos = client.search("q", "low").await.unwrap().unwrap();
        assert!(videos.is_empty());
        mock.assert_async().await;
    }
}
