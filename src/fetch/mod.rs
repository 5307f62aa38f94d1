mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::ApiError;
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

/// GETs `url` through `client` and decodes the JSON body as `T`.
///
/// A non-2xx status becomes [`ApiError::Status`] carrying the response body;
/// `what` names the payload in decode errors.
pub async fn fetch_json<C, T>(client: &C, url: Url, what: &'static str) -> Result<T, ApiError>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let mut req = reqwest::Request::new(reqwest::Method::GET, url);
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("application/json"));

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), what, "Response body received");
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { what, source })
}
