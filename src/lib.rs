#![cfg_attr(docsrs, feature(doc_cfg))]
//! fetch-state is a data-fetching state primitive for interactive user interfaces.
//!
//! Given a resource locator, a [FetchController](`controller::FetchController`) retrieves remote
//! data asynchronously, exposes whether a retrieval is in flight, and yields either the parsed
//! result or the failure reason to the consuming view. It retrieves again only when its
//! dependencies change.
//!
//! # Features
//!
//! - Observation based. The controller never returns errors to its caller, the
//!   `(result, failure, pending)` triple is all there is to look at.
//! - Explicit dependencies. The locator, options and guard of every render are compared against
//!   the previous render through an [Effect](`effect::Effect`), and only a change triggers a new
//!   activation.
//! - Pluggable transport. Anything implementing [Transport](`transport::Transport`) can perform
//!   the retrieval, an HTTP implementation is available with the `http` feature.
//! - No stale writes. A retrieval that completes after its configuration was replaced does not
//!   overwrite the state of the new configuration.
//! - Observable runtime. The controller state can be watched for changes, and every activation
//!   is instrumented with the [tracing crate](https://crates.io/crates/tracing).
//!
//! # Controller
//!
//! The host (the view framework) creates one controller per usage site and calls
//! [render](`controller::FetchController::render`) on every render with the current
//! [FetchConfig](`request::FetchConfig`).
//!
//! ```rust
//! use fetch_state::controller::FetchController;
//! use fetch_state::request::{FetchConfig, Guard};
//! use fetch_state::state::Phase;
//! use fetch_state::testing::MockTransport;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Deserialize, PartialEq)]
//! struct Coffee {
//!     id: u32,
//!     title: String,
//! }
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new().resolve_once(json!({"id": 1, "title": "Black Coffee"}));
//! let mut controller: FetchController<_, Coffee> = FetchController::new(transport);
//! let mut observer = controller.subscribe();
//!
//! controller.render(FetchConfig::new("hot/1"));
//!
//! // wait for the view to be notified of the result
//! let state = observer.wait_for(|s| s.result.is_some()).await.unwrap();
//! assert_eq!(state.phase(), Phase::Resolved);
//! assert_eq!(state.result().map(|c| c.title.as_str()), Some("Black Coffee"));
//! # })
//! ```
//!
//! ## Activation
//!
//! Each activation runs as a separate task and
//!
//! 1. evaluates the [Guard](`request::Guard`). A rejecting guard clears any held result and
//!    failure, and nothing is retrieved.
//! 2. checks the state is clean: no result, no failure and nothing in flight for the current
//!    configuration. State left by a previous configuration is cleared.
//! 3. retrieves the locator through the transport and stores the parsed payload, or the failure.
//!
//! ## States
//!
//! The [Phase](`state::Phase`) of a controller is derived from its state
//!
//! - `Idle`: nothing held, nothing in flight. The initial phase.
//! - `Pending`: a retrieval is in flight.
//! - `Resolved`: a result is held.
//! - `Rejected`: a failure is held.
//!
//! `Resolved` and `Rejected` go back to `Idle` when the guard rejects, and to `Pending` when the
//! configuration changes.
//!
//! ## Errors
//!
//! Transport and parse failures are both stored as an [Error](`error::Error`), whose
//! [kind](`error::Error::kind`) tells them apart. Note that the HTTP transport does not treat
//! error statuses as failures, a JSON error body is a valid result.
//!
//! # Logging
//!
//! The library only emits [tracing](https://docs.rs/tracing) spans and events. With the
//! `logging` feature, `init_logging()` installs a subscriber that turns activations into
//! readable [log](https://docs.rs/log) records.

pub mod controller;
pub mod effect;
pub mod error;
pub mod request;
pub mod result;
pub mod state;
pub mod testing;
pub mod transport;

#[cfg(feature = "logging")]
mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::init as init_logging;
