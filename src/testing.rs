//! Scripted transports for tests
//!
//! [`MockTransport`] replays queued replies in order and records every call, which allows to
//! assert on how many retrievals a controller issued and for which locators.
//!
//! ```rust
//! use fetch_state::testing::MockTransport;
//! use fetch_state::transport::{Response, Transport};
//! use fetch_state::request::{Locator, Options};
//! use serde_json::json;
//!
//! let transport = MockTransport::new()
//!     .resolve_once(json!({"id": 1}))
//!     .reject_once("Failed to fetch");
//!
//! # tokio_test::block_on(async {
//! let locator = Locator::from("hot/1");
//! let res = transport.retrieve(&locator, &Options::new()).await.unwrap();
//! assert_eq!(res.json().await.unwrap(), json!({"id": 1}));
//!
//! let err = transport.retrieve(&locator, &Options::new()).await.unwrap_err();
//! assert_eq!(err.to_string(), "Failed to fetch");
//! assert_eq!(transport.calls(), 2);
//! # })
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::request::{Locator, Options};
use crate::result::Result;
use crate::transport::{Response, Transport};

enum Reply {
    Json(Value),
    Body(String),
    Reject(String),
    Deferred(oneshot::Receiver<Reply>),
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    calls: Vec<(Locator, Options)>,
}

/// A transport replaying a script of replies
///
/// Clones share the same script, keep a clone around to inspect the calls after handing the
/// transport to a controller. When the script runs out, retrievals fail with a transport error.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // a panicking test must not hide the state from the others
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(self, reply: Reply) -> Self {
        self.script().replies.push_back(reply);
        self
    }

    /// Queue a reply with the given JSON body
    pub fn resolve_once(self, body: Value) -> Self {
        self.push(Reply::Json(body))
    }

    /// Queue a reply with a raw body, which may not be valid JSON
    pub fn respond_once(self, body: impl Into<String>) -> Self {
        self.push(Reply::Body(body.into()))
    }

    /// Queue a transport failure with the given message
    pub fn reject_once(self, message: impl Into<String>) -> Self {
        self.push(Reply::Reject(message.into()))
    }

    /// Queue a reply that is only delivered once the returned [`Deferred`] is completed
    ///
    /// The retrieval stays in flight until then, dropping the `Deferred` fails it with a
    /// transport error.
    pub fn defer_once(&self) -> Deferred {
        let (tx, rx) = oneshot::channel();
        self.script().replies.push_back(Reply::Deferred(rx));
        Deferred(tx)
    }

    /// Number of retrievals so far
    pub fn calls(&self) -> usize {
        self.script().calls.len()
    }

    /// Locators of every retrieval so far, in call order
    pub fn locators(&self) -> Vec<Locator> {
        self.script()
            .calls
            .iter()
            .map(|(locator, _)| locator.clone())
            .collect()
    }

    /// Options of every retrieval so far, in call order
    pub fn options(&self) -> Vec<Options> {
        self.script()
            .calls
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }
}

/// A reply held back by [`MockTransport::defer_once`]
pub struct Deferred(oneshot::Sender<Reply>);

impl Deferred {
    pub fn resolve(self, body: Value) {
        let _ = self.0.send(Reply::Json(body));
    }

    pub fn respond(self, body: impl Into<String>) {
        let _ = self.0.send(Reply::Body(body.into()));
    }

    pub fn reject(self, message: impl Into<String>) {
        let _ = self.0.send(Reply::Reject(message.into()));
    }
}

/// A response produced by [`MockTransport`]
#[derive(Debug)]
pub enum MockResponse {
    Json(Value),
    Body(String),
}

#[async_trait]
impl Response for MockResponse {
    async fn json(self) -> Result<Value> {
        match self {
            MockResponse::Json(value) => Ok(value),
            MockResponse::Body(body) => Ok(serde_json::from_str(&body)?),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Response = MockResponse;

    async fn retrieve(&self, locator: &Locator, options: &Options) -> Result<MockResponse> {
        let next = {
            let mut script = self.script();
            script.calls.push((locator.clone(), options.clone()));
            script.replies.pop_front()
        };

        let mut reply = next.ok_or_else(|| Error::transport(format!("no reply for {locator}")))?;
        loop {
            match reply {
                Reply::Json(value) => return Ok(MockResponse::Json(value)),
                Reply::Body(body) => return Ok(MockResponse::Body(body)),
                Reply::Reject(message) => return Err(Error::transport(message)),
                Reply::Deferred(rx) => {
                    reply = rx.await.map_err(|_| {
                        Error::transport(format!("deferred reply for {locator} dropped"))
                    })?;
                }
            }
        }
    }
}
