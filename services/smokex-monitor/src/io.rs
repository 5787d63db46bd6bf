//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

use crate::MonitorError;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &str) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn classify(method: &str, url: &str, e: reqwest::Error) -> MonitorError {
    if e.is_timeout() {
        MonitorError::Timeout(format!("{} {} timed out: {}", method, url, e))
    } else {
        MonitorError::Http(format!("{} {} failed: {}", method, url, e))
    }
}

async fn into_response(
    method: &str,
    url: &str,
    response: reqwest::Response,
) -> crate::Result<HttpResponse> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| classify(method, url, e))?;

    tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
    Ok(HttpResponse { status, body })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify("GET", url, e))?;

        into_response("GET", url, response).await
    }

    async fn post_json(&self, url: &str, body: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| classify("POST", url, e))?;

        into_response("POST", url, response).await
    }
}
