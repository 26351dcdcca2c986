pub mod error;
pub mod models;
pub mod pagerduty;
pub mod pagination;

pub use pagerduty::{IncidentPages, PagerDuty, PagerDutyClient, SchedulePages, DEFAULT_BASE_URL};

use error::{ApiError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, FROM};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

const PAGERDUTY_ACCEPT: &str = "application/vnd.pagerduty+json;version=2";

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let mut url = Url::parse(base_url.as_ref()).map_err(ApiError::InvalidUrl)?;
        // Relative joins replace the last segment unless the base ends in '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(PAGERDUTY_ACCEPT));

        let client = Client::builder()
            .user_agent(format!("pd-buddy/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ApiError::RequestFailed)?;

        Ok(Self {
            client,
            base_url: url,
            token: None,
        })
    }

    /// Authenticate every request with `Authorization: Token token=<token>`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, Option::<&()>::None).await
    }

    /// PUT on behalf of a user; PagerDuty attributes the change to the `From` email.
    pub async fn put_from<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        from: &str,
    ) -> Result<T> {
        let mut headers = HeaderMap::new();
        headers.insert(FROM, HeaderValue::from_str(from)?);
        self.send(Method::PUT, path, Some(body), headers).await
    }

    pub async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        self.send(method, path, body, HeaderMap::new()).await
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<T> {
        let joined = self
            .base_url
            .join(path.strip_prefix('/').unwrap_or(path))
            .map_err(ApiError::InvalidUrl)?;

        debug!(method = %method, url = %joined, "Sending request");

        let mut req = self
            .client
            .request(method, joined.clone())
            .headers(headers);
        req = self.apply_auth(req);

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(ApiError::RequestFailed)?;
        let status = response.status();
        debug!(status = status.as_u16(), "Received response");

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthenticationFailed {
                message: "Invalid or expired credentials".to_string(),
            }),
            StatusCode::FORBIDDEN => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Forbidden".to_string());
                Err(ApiError::Forbidden { message })
            }
            StatusCode::NOT_FOUND => {
                let resource = joined.path().to_string();
                Err(ApiError::NotFound { resource })
            }
            StatusCode::BAD_REQUEST => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Bad request".to_string());
                Err(ApiError::BadRequest { message })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                Err(ApiError::RateLimitExceeded { retry_after })
            }
            status if status.is_success() => response.json::<T>().await.map_err(|e| {
                error!("Failed to parse JSON response: {}", e);
                ApiError::InvalidResponse(e.to_string())
            }),
            status => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("Unexpected status: {}", status));
                Err(ApiError::ServerError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Token token={token}")),
            None => request,
        }
    }
}
