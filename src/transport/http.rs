//! HTTP transport backed by [reqwest](https://docs.rs/reqwest)
//!
//! Responses are never rejected because of their status code. A server answering `500` with a
//! JSON body resolves to that body, it is up to the consumer to inspect the payload.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use super::{Response, Transport};
use crate::error::Error;
use crate::request::{Locator, Options};
use crate::result::Result;

/// A [`Transport`] performing HTTP requests
///
/// Absolute locators are requested as is, relative locators are joined onto the base URL if one
/// was configured.
///
/// ```rust
/// use fetch_state::transport::http::HttpTransport;
///
/// let transport = HttpTransport::new()
///     .with_base("https://api.sampleapis.com/coffee/")
///     .unwrap();
///
/// assert_eq!(
///     transport.resolve(&"hot/1".into()).unwrap().as_str(),
///     "https://api.sampleapis.com/coffee/hot/1"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
    base: Option<Url>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a pre-configured reqwest client
    pub fn with_client(self, client: Client) -> Self {
        let mut transport = self;
        transport.client = client;
        transport
    }

    /// Set the base URL for relative locators
    pub fn with_base(self, base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(Error::transport)?;
        let mut transport = self;
        transport.base = Some(base);
        Ok(transport)
    }

    /// Resolve a locator into the URL to request
    pub fn resolve(&self, locator: &Locator) -> Result<Url> {
        // joining an absolute URL onto the base yields the absolute URL
        let url = match &self.base {
            Some(base) => base.join(locator.as_str()),
            None => Url::parse(locator.as_str()),
        };
        url.map_err(Error::transport)
    }
}

/// A response received by the [`HttpTransport`]
#[derive(Debug)]
pub struct HttpResponse(reqwest::Response);

#[async_trait]
impl Response for HttpResponse {
    async fn json(self) -> Result<Value> {
        let body = self.0.bytes().await.map_err(Error::transport)?;
        let value = serde_json::from_slice(&body)?;
        Ok(value)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    type Response = HttpResponse;

    async fn retrieve(&self, locator: &Locator, options: &Options) -> Result<HttpResponse> {
        let url = self.resolve(locator)?;
        let method = reqwest::Method::from_bytes(options.method().as_str().as_bytes())
            .map_err(Error::transport)?;

        let mut request = self.client.request(method, url);
        for (name, value) in options.headers() {
            request = request.header(name, value);
        }
        if let Some(body) = options.body() {
            request = request.body(body.to_owned());
        }

        let response = request.send().await.map_err(Error::transport)?;
        debug!(status = response.status().as_u16(), "response received");
        Ok(HttpResponse(response))
    }
}
