//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("muziko-sync/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - Automatic retry with exponential backoff on 5xx and 429
/// - Per-request timeouts reported as [`BridgeError::Timeout`]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with a default request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
        if policy.use_exponential_backoff {
            let exponential_delay = policy.base_delay * 2u32.pow(attempt.saturating_sub(1));
            exponential_delay.min(policy.max_delay)
        } else {
            policy.base_delay
        }
    }

    async fn execute_with_retry_internal(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let max_attempts = policy.max_attempts.max(1);
        let timeout_ms = request.timeout.map(|t| t.as_millis() as u64).unwrap_or(0);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts,
                url = %redact_query(&request.url),
                "Executing HTTP request"
            );

            match self.build_request(request.clone()).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if status >= 500 || status == 429 {
                        warn!(status, attempt = attempt + 1, "HTTP request failed with retryable status");
                        last_error = Some(BridgeError::OperationFailed(format!(
                            "HTTP {} error",
                            status
                        )));
                    } else {
                        let headers: HashMap<String, String> = response
                            .headers()
                            .iter()
                            .filter_map(|(k, v)| {
                                v.to_str().ok().map(|s| (k.to_string(), s.to_string()))
                            })
                            .collect();

                        let body = response
                            .bytes()
                            .await
                            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

                        return Ok(HttpResponse {
                            status,
                            headers,
                            body,
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt + 1, "HTTP request failed");

                    last_error = Some(if e.is_timeout() {
                        BridgeError::Timeout(timeout_ms)
                    } else if e.is_connect() {
                        BridgeError::OperationFailed(format!("Connection failed: {}", e))
                    } else {
                        BridgeError::OperationFailed(e.to_string())
                    });
                }
            }

            attempt += 1;

            if attempt < max_attempts {
                let delay = Self::backoff(&policy, attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, RetryPolicy::default())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_with_retry_internal(request, policy).await
    }
}
