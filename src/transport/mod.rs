//! The retrieval boundary
//!
//! A [`Transport`] turns a `(locator, options)` pair into a [`Response`], which in turn parses
//! its body into JSON. Both steps are asynchronous and may fail.
//!
//! Any async function can be used as a transport through [`from_fn`]
//!
//! ```rust
//! use fetch_state::transport::{from_fn, Response, Transport};
//! use fetch_state::request::{Locator, Options};
//! use serde_json::json;
//!
//! let transport = from_fn(|locator: Locator, _| async move {
//!     Ok(json!({ "locator": locator.as_str() }))
//! });
//!
//! # tokio_test::block_on(async {
//! let response = transport.retrieve(&Locator::from("hot/1"), &Options::new()).await.unwrap();
//! assert_eq!(response.json().await.unwrap(), json!({ "locator": "hot/1" }));
//! # })
//! ```

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::request::{Locator, Options};
use crate::result::Result;

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub mod http;

/// A response returned by a [`Transport`]
#[async_trait]
pub trait Response: Send {
    /// Parse the response body into a JSON value
    async fn json(self) -> Result<Value>;
}

/// Retrieves a resource given its locator and options
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Response: Response;

    async fn retrieve(&self, locator: &Locator, options: &Options) -> Result<Self::Response>;
}

/// A response whose body was already parsed
#[derive(Debug, Clone)]
pub struct Parsed(pub Value);

#[async_trait]
impl Response for Parsed {
    async fn json(self) -> Result<Value> {
        Ok(self.0)
    }
}

type RetrieveFn = dyn Fn(Locator, Options) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// A transport backed by an async function
///
/// Created with [`from_fn`]
pub struct FnTransport(Box<RetrieveFn>);

/// Create a transport from an async function returning the parsed payload
pub fn from_fn<F, Fut>(f: F) -> FnTransport
where
    F: Fn(Locator, Options) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    FnTransport(Box::new(move |locator, options| f(locator, options).boxed()))
}

#[async_trait]
impl Transport for FnTransport {
    type Response = Parsed;

    async fn retrieve(&self, locator: &Locator, options: &Options) -> Result<Parsed> {
        let value = (self.0)(locator.clone(), options.clone()).await?;
        Ok(Parsed(value))
    }
}
