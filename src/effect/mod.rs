//! Explicit dependency tracking
//!
//! An [`Effect`] is a callback registered together with a list of watched values ([`Deps`]). The
//! callback runs on the first call to [`Effect::run`] and afterwards only when one of the watched
//! values changed since the previous run.
//!
//! Values can be watched in two ways
//!
//! - by value, with [`Dep::value`], for primitive-like inputs such as a locator
//! - by identity, with [`Dep::identity`], for shared inputs such as options or predicates. Two
//!   identity dependencies are equal only if they point to the same allocation.
//!
//! ```rust
//! use std::sync::Arc;
//! use fetch_state::effect::{Dep, Deps, Effect};
//!
//! let opts = Arc::new(vec![1, 2, 3]);
//! let mut effect = Effect::new();
//!
//! let deps = || Deps::new().watch(Dep::value("hot/1")).watch(Dep::identity(&opts));
//!
//! // first run always executes
//! assert_eq!(effect.run(deps(), || "ran"), Some("ran"));
//!
//! // same values, nothing to do
//! assert_eq!(effect.run(deps(), || "ran"), None);
//!
//! // a new allocation is a change, even if the contents are the same
//! let other = Arc::new(vec![1, 2, 3]);
//! let deps = Deps::new().watch(Dep::value("hot/1")).watch(Dep::identity(&other));
//! assert_eq!(effect.run(deps, || "ran"), Some("ran"));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

/// A single watched value
#[derive(Clone)]
pub enum Dep {
    /// Compared by value
    Value(String),
    /// Compared by pointer identity
    ///
    /// The dependency holds a reference to the value, meaning the allocation cannot be freed and
    /// reused while the dependency is stored.
    Identity(Arc<dyn Any + Send + Sync>),
}

impl Dep {
    pub fn value(value: impl Into<String>) -> Self {
        Dep::Value(value.into())
    }

    pub fn identity<T: Send + Sync + 'static>(value: &Arc<T>) -> Self {
        Dep::Identity(value.clone())
    }

    fn addr(ptr: &Arc<dyn Any + Send + Sync>) -> *const () {
        Arc::as_ptr(ptr) as *const ()
    }
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Dep::Value(a), Dep::Value(b)) => a == b,
            (Dep::Identity(a), Dep::Identity(b)) => Dep::addr(a) == Dep::addr(b),
            _ => false,
        }
    }
}

impl Eq for Dep {}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dep::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Dep::Identity(ptr) => f.debug_tuple("Identity").field(&Dep::addr(ptr)).finish(),
        }
    }
}

/// An ordered list of watched values
///
/// Lists with a different number of dependencies are always considered different.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Deps(Vec<Dep>);

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency to the list
    pub fn watch(self, dep: Dep) -> Self {
        let mut deps = self;
        deps.0.push(dep);
        deps
    }
}

impl FromIterator<Dep> for Deps {
    fn from_iter<I: IntoIterator<Item = Dep>>(iter: I) -> Self {
        Deps(iter.into_iter().collect())
    }
}

/// Runs a callback when its dependencies change
#[derive(Debug, Default)]
pub struct Effect {
    deps: Option<Deps>,
}

impl Effect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the callback if `deps` differ from the dependencies of the last run
    ///
    /// Returns the callback output, or `None` if the callback was skipped.
    pub fn run<R, F: FnOnce() -> R>(&mut self, deps: Deps, callback: F) -> Option<R> {
        if self.deps.as_ref() == Some(&deps) {
            trace!("dependencies unchanged");
            return None;
        }

        self.deps = Some(deps);
        Some(callback())
    }

    /// Forget the stored dependencies, making the next run unconditional
    pub fn reset(&mut self) {
        self.deps = None;
    }
}
