use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{ApiConfig, RequestConfig};
use crate::error::{ApiError, ApiResult};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Client for the strategist backend REST API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    request_config: RequestConfig,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ApiConfig, request_config: RequestConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(ApiError::Http)?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            ApiError::InvalidUrl {
                url: config.base_url.clone(),
                message: e.to_string(),
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: config.base_url.clone(),
                message: "URL cannot be a base".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Resolve path segments against the base URL. Segments are
    /// percent-encoded, so ids never alter the route.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                message: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with auth and a fresh request id attached.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        self.fetch_json(self.request(Method::GET, url)).await
    }

    /// Send a prepared request and decode a JSON body.
    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let response = self.execute(builder).await?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Send a prepared request and discard the body.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> ApiResult<()> {
        let response = self.execute(builder).await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// GET a keyed resource.
    ///
    /// HTTP 404 becomes [`ApiError::NotFound`]; HTTP 204 or an empty body
    /// becomes `Ok(None)`.
    pub(crate) async fn lookup_json<T: DeserializeOwned>(
        &self,
        url: Url,
        resource: &str,
    ) -> ApiResult<Option<T>> {
        let response = self.execute(self.request(Method::GET, url)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(ApiError::NotFound {
                    resource: resource.to_string(),
                })
            }
            StatusCode::NO_CONTENT => return Ok(None),
            _ => {}
        }

        let body = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                message: format!("Failed to read response: {}", e),
            })?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ApiError::InvalidResponse {
                message: format!("Failed to parse {} response: {}", resource, e),
            })
    }

    /// POST or PUT a JSON body and decode the JSON response.
    pub(crate) async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch_json(self.request(method, url).json(body)).await
    }

    /// Execute a single request (internal)
    async fn execute(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let request = builder.build().map_err(ApiError::Http)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        debug!(%method, %path, %request_id, "Calling API");

        let start = Instant::now();
        let result = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    timeout_ms: self.request_config.timeout_ms,
                }
            } else {
                ApiError::Http(e)
            }
        });
        let latency = start.elapsed();

        match result {
            Ok(response) => {
                info!(
                    %method,
                    %path,
                    %request_id,
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "API call completed"
                );
                Ok(response)
            }
            Err(e) => {
                error!(
                    %method,
                    %path,
                    %request_id,
                    error = %e,
                    latency_ms = latency.as_millis(),
                    "API call failed"
                );
                Err(e)
            }
        }
    }
}

async fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();

    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(ApiError::Api {
            status: status.as_u16(),
            message: error_body,
        });
    }

    Ok(response)
}
