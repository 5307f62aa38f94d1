use crate::error::ApiError;
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// Header carrying the grading API's shared secret.
pub const FUNCTIONS_KEY_HEADER: &str = "x-functions-key";

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header name and value are validated once at construction, so
/// executing a request never fails on a bad credential string.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, ApiError> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| ApiError::InvalidRequest(format!("header name '{header_name}': {e}")))?;
        let mut value = HeaderValue::from_str(key)
            .map_err(|e| ApiError::InvalidRequest(format!("api key header value: {e}")))?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// Uses the `x-functions-key` header expected by the grading API.
    pub fn functions_key(inner: C, key: &str) -> Result<Self, ApiError> {
        Self::new(inner, FUNCTIONS_KEY_HEADER, key)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
