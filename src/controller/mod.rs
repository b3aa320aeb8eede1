//! The fetch state controller
//!
//! A [`FetchController`] owns the `(result, failure, pending)` state of one usage site. The host
//! calls [`FetchController::render`] on every render with the current [`FetchConfig`]. When
//! the locator, options or guard changed since the previous render, the controller spawns an
//! activation which
//!
//! 1. evaluates the guard. If it rejects, the held result and failure are cleared and nothing
//!    is retrieved.
//! 2. checks that the state is clean for the current configuration (nothing held, nothing in
//!    flight). State held for a previous configuration is cleared.
//! 3. retrieves the resource through the [`Transport`], parses the response and stores either
//!    the payload or the failure.
//!
//! Failures never escape the controller, they are only observable through the state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, field, span, Instrument, Level, Span};

mod cells;
mod observer;

pub use observer::*;

use cells::{Cells, Settled};

use crate::effect::Effect;
use crate::request::FetchConfig;
use crate::result::Result;
use crate::state::FetchState;
use crate::transport::{Response, Transport};

#[derive(Debug, Clone)]
pub struct Opts {
    /// Drop the outcome of a retrieval whose configuration was replaced while it was in flight.
    /// Defaults to true. When false, the last retrieval to complete wins.
    discard_stale: bool,
    /// Reset `pending` immediately when the guard rejects an activation. Defaults to true.
    /// When false, `pending` stays set until the in-flight retrieval completes.
    reset_pending_on_reject: bool,
}

impl Opts {
    pub fn discard_stale(self, discard_stale: bool) -> Self {
        let mut opts = self;
        opts.discard_stale = discard_stale;
        opts
    }

    pub fn reset_pending_on_reject(self, reset_pending_on_reject: bool) -> Self {
        let mut opts = self;
        opts.reset_pending_on_reject = reset_pending_on_reject;
        opts
    }
}

impl Default for Opts {
    fn default() -> Self {
        Opts {
            discard_stale: true,
            reset_pending_on_reject: true,
        }
    }
}

struct Shared<T> {
    cells: watch::Sender<Cells<T>>,
    /// epoch of the most recent configuration
    latest: AtomicU64,
}

/// A handle to a spawned activation
///
/// Dropping the handle does not cancel the activation.
#[derive(Debug)]
pub struct Activation {
    epoch: u64,
    handle: JoinHandle<()>,
}

impl Activation {
    /// The configuration epoch this activation was issued for
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Wait for the activation to finish
    ///
    /// # Panics
    ///
    /// Resumes the panic if the transport panicked during the activation
    pub async fn settled(self) {
        if let Err(err) = self.handle.await {
            if err.is_panic() {
                std::panic::resume_unwind(err.into_panic());
            }
        }
    }
}

/// Data fetching state for one usage site
///
/// `T` is the payload type the response is deserialized into, it defaults to
/// [`serde_json::Value`].
///
/// ```rust
/// use fetch_state::controller::FetchController;
/// use fetch_state::request::FetchConfig;
/// use fetch_state::transport::from_fn;
/// use serde_json::{json, Value};
///
/// # tokio_test::block_on(async {
/// let transport = from_fn(|_, _| async { Ok(json!({"id": 1, "title": "Black Coffee"})) });
/// let mut controller: FetchController<_, Value> = FetchController::new(transport);
///
/// // the first render always activates
/// let activation = controller.render(FetchConfig::new("hot/1")).unwrap();
/// activation.settled().await;
///
/// let state = controller.state();
/// assert!(!state.pending);
/// assert!(state.failure.is_none());
/// assert_eq!(state.result(), Some(&json!({"id": 1, "title": "Black Coffee"})));
///
/// // nothing changed, nothing to do
/// assert!(controller.render(FetchConfig::new("hot/1")).is_none());
/// # })
/// ```
///
/// The controller spawns its activations on the Tokio runtime, it must be used within the
/// context of one.
pub struct FetchController<X, T = Value> {
    transport: Arc<X>,
    shared: Arc<Shared<T>>,
    effect: Effect,
    config: Option<FetchConfig>,
    opts: Opts,
}

impl<X, T> FetchController<X, T>
where
    X: Transport,
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(transport: X) -> Self {
        let (cells, _) = watch::channel(Cells::new());
        Self {
            transport: Arc::new(transport),
            shared: Arc::new(Shared {
                cells,
                latest: AtomicU64::new(0),
            }),
            effect: Effect::new(),
            config: None,
            opts: Opts::default(),
        }
    }

    pub fn with_opts(self, opts: Opts) -> Self {
        let mut controller = self;
        controller.opts = opts;
        controller
    }

    /// Supply the configuration for the current render
    ///
    /// Spawns an activation if the locator, options or guard changed since the last render (or
    /// if this is the first render) and returns its handle. Returns `None` otherwise.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn render(&mut self, config: FetchConfig) -> Option<Activation> {
        let activation = self.effect.run(config.deps(), || {
            let epoch = self.shared.latest.fetch_add(1, Ordering::SeqCst) + 1;
            spawn_activation(
                self.shared.clone(),
                self.transport.clone(),
                config.clone(),
                epoch,
                self.opts.clone(),
            )
        });
        self.config = Some(config);
        activation
    }

    /// Run the activation again for the last rendered configuration
    ///
    /// No new epoch is issued, so the clean state rule applies: nothing is retrieved while a
    /// result or failure is held or a retrieval is in flight. Returns `None` before the first
    /// render.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn activate(&self) -> Option<Activation> {
        let config = self.config.clone()?;
        let epoch = self.shared.latest.load(Ordering::SeqCst);
        Some(spawn_activation(
            self.shared.clone(),
            self.transport.clone(),
            config,
            epoch,
            self.opts.clone(),
        ))
    }
}

impl<X, T> FetchController<X, T> {
    /// The current `(result, failure, pending)` triple
    pub fn state(&self) -> FetchState<T> {
        self.shared.cells.borrow().state.clone()
    }

    /// Watch the controller state
    pub fn subscribe(&self) -> Observer<T> {
        Observer(self.shared.cells.subscribe())
    }

    /// The configuration of the last render
    pub fn config(&self) -> Option<&FetchConfig> {
        self.config.as_ref()
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }
}

fn spawn_activation<X, T>(
    shared: Arc<Shared<T>>,
    transport: Arc<X>,
    config: FetchConfig,
    epoch: u64,
    opts: Opts,
) -> Activation
where
    X: Transport,
    T: DeserializeOwned + Send + Sync + 'static,
{
    let span = span!(
        Level::INFO,
        "activate",
        locator = %config.locator(),
        epoch,
        return = field::Empty,
        error = field::Empty
    );
    let handle = tokio::spawn(activate(shared, transport, config, epoch, opts).instrument(span));
    Activation { epoch, handle }
}

async fn activate<X, T>(
    shared: Arc<Shared<T>>,
    transport: Arc<X>,
    config: FetchConfig,
    epoch: u64,
    opts: Opts,
) where
    X: Transport,
    T: DeserializeOwned + Send + Sync + 'static,
{
    let cur_span = Span::current();

    if shared.latest.load(Ordering::SeqCst) > epoch {
        cur_span.record("return", "superseded");
        return;
    }

    if !config.get_guard().check() {
        shared
            .cells
            .send_if_modified(|cells| cells.reject(epoch, opts.reset_pending_on_reject));
        cur_span.record("return", "skipped");
        return;
    }

    if !shared.cells.send_if_modified(|cells| cells.begin(epoch)) {
        cur_span.record("return", "blocked");
        return;
    }

    debug!("retrieving");
    let outcome = retrieve::<X, T>(&transport, &config).await;
    if let Err(err) = &outcome {
        cur_span.record("error", field::display(err));
    }
    let resolved = outcome.is_ok();

    // the cells may have changed while the retrieval was suspended, settle
    // decides from the state at completion
    let mut settled = Settled::Discarded;
    shared.cells.send_if_modified(|cells| {
        settled = cells.settle(epoch, outcome, opts.discard_stale);
        settled != Settled::Discarded
    });

    let ret = match settled {
        Settled::Applied if resolved => "resolved",
        Settled::Applied => "rejected",
        Settled::Released | Settled::Discarded => "discarded",
    };
    cur_span.record("return", ret);
}

async fn retrieve<X, T>(transport: &X, config: &FetchConfig) -> Result<T>
where
    X: Transport,
    T: DeserializeOwned,
{
    let response = transport
        .retrieve(config.locator(), config.get_options())
        .await?;
    let payload = response.json().await?;
    let result = serde_json::from_value(payload)?;
    Ok(result)
}
