use async_trait::async_trait;
use reqwest::{Request, Response};
use std::sync::Arc;

/// Something that can execute a prepared HTTP request.
///
/// The seam exists so request decorators ([`ApiKey`](super::auth::ApiKey),
/// [`UrlParam`](super::auth::UrlParam)) can be stacked, and so tests can
/// answer requests without a network.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
