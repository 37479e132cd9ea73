use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::retry::RetryPolicy;

/// JSON HTTP client bound to one upstream base URL.
///
/// Every request is retried on 5xx, 429 and transport failures up to
/// `policy.max_retries` times. Other 4xx answers and non-JSON responses are
/// returned on the first attempt.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    default_headers: HeaderMap,
    policy: RetryPolicy,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self::from_client(Client::new(), base_url, policy)
    }

    /// Like [`ApiClient::new`] but every attempt is bounded by `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::from_client(client, base_url, policy))
    }

    fn from_client(client: Client, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_headers: HeaderMap::new(),
            policy,
        }
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self, ApiError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::InvalidHeader(format!("{}: {}", name, e)))?;
        self.default_headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Joins `path` onto the base URL and appends the encoded query pairs.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    pub async fn get<T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, query, None, bearer).await
    }

    pub async fn post<T>(&self, path: &str, body: &Value, bearer: Option<&str>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, &[], Some(body), bearer).await
    }

    pub async fn put<T>(&self, path: &str, body: &Value, bearer: Option<&str>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, &[], Some(body), bearer).await
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        let mut attempt = 0;

        loop {
            match self.attempt(method.clone(), url.clone(), body, bearer).await {
                Ok(data) => return Ok(data),
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "{} {} failed ({}), retrying in {:?} ({}/{})",
                        method,
                        url.path(),
                        err,
                        delay,
                        attempt + 1,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!("{} {} failed after {} retries: {}", method, url.path(), attempt, err);
                    return Err(err);
                }
            }
        }
    }

    async fn attempt<T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        debug!("Making request to {} {}", method, url);

        let mut req = self
            .client
            .request(method, url)
            .headers(self.default_headers.clone());

        if let Some(token) = bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        if let Some(body_data) = body {
            req = req.json(body_data);
        }

        let response = req.send().await?;
        let status = response.status();

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            let body = read_error_body(response).await;
            return Err(ApiError::Status { status: status.as_u16(), body });
        }

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !is_json(&content_type) {
            return Err(ApiError::InvalidContentType {
                status: status.as_u16(),
                content_type,
            });
        }

        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(ApiError::Status { status: status.as_u16(), body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}

async fn read_error_body(response: Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
