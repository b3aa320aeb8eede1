//! Controller inputs
//!
//! A [`FetchConfig`] bundles the three watched inputs of a
//! [`FetchController`](`crate::controller::FetchController`): the [`Locator`] to retrieve, the
//! [`Options`] for the transport and the [`Guard`] deciding whether to retrieve at all.

use std::sync::Arc;

mod guard;
mod locator;
mod options;

pub use guard::*;
pub use locator::*;
pub use options::*;

use crate::effect::{Dep, Deps};

/// The configuration supplied to the controller on every render
///
/// ```rust
/// use std::sync::Arc;
/// use fetch_state::request::{FetchConfig, Guard, Options};
///
/// let opts = Arc::new(Options::new().with_header("accept", "application/json"));
/// let config = FetchConfig::new("hot/1")
///     .options(opts.clone())
///     .guard(Guard::new(|| true));
///
/// assert_eq!(config.locator().as_str(), "hot/1");
/// ```
#[derive(Debug, Clone)]
pub struct FetchConfig {
    locator: Locator,
    options: Arc<Options>,
    guard: Guard,
}

impl FetchConfig {
    pub fn new(locator: impl Into<Locator>) -> Self {
        Self {
            locator: locator.into(),
            options: Options::shared_default(),
            guard: Guard::always(),
        }
    }

    /// Set the transport options
    ///
    /// Passing an owned `Options` allocates a new instance, which counts as a dependency change
    /// on every render. Pass a shared `Arc<Options>` to keep it stable.
    pub fn options(self, options: impl Into<Arc<Options>>) -> Self {
        let mut config = self;
        config.options = options.into();
        config
    }

    pub fn guard(self, guard: Guard) -> Self {
        let mut config = self;
        config.guard = guard;
        config
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn get_options(&self) -> &Arc<Options> {
        &self.options
    }

    pub fn get_guard(&self) -> &Guard {
        &self.guard
    }

    /// The watched dependencies of this configuration
    pub(crate) fn deps(&self) -> Deps {
        Deps::new()
            .watch(Dep::value(self.locator.as_str()))
            .watch(Dep::identity(&self.options))
            .watch(Dep::identity(&self.guard.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_keeps_deps_stable_with_defaults() {
        let a = FetchConfig::new("hot/1");
        let b = FetchConfig::new("hot/1");
        assert_eq!(a.deps(), b.deps());
    }

    #[test]
    fn it_changes_deps_on_new_options() {
        let a = FetchConfig::new("hot/1").options(Options::new());
        let b = FetchConfig::new("hot/1").options(Options::new());
        assert_ne!(a.deps(), b.deps());
    }

    #[test]
    fn it_keeps_deps_on_shared_options_and_guard() {
        let opts = Arc::new(Options::new());
        let guard = Guard::new(|| true);
        let a = FetchConfig::new("hot/1")
            .options(opts.clone())
            .guard(guard.clone());
        let b = FetchConfig::new("hot/1").options(opts).guard(guard);
        assert_eq!(a.deps(), b.deps());
    }

    #[test]
    fn it_changes_deps_on_locator() {
        let a = FetchConfig::new("hot/1");
        let b = FetchConfig::new("hot/2");
        assert_ne!(a.deps(), b.deps());
    }
}
