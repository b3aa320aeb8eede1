use std::fmt;
use std::sync::{Arc, OnceLock};

pub(crate) struct Predicate(Box<dyn Fn() -> bool + Send + Sync>);

/// A zero-argument predicate deciding whether a retrieval should proceed
///
/// Guards are watched by identity. Cloning a guard keeps its identity, creating a new one with
/// [`Guard::new`] always yields a different dependency, even for the same closure.
///
/// ```rust
/// use fetch_state::request::Guard;
///
/// let guard = Guard::new(|| false);
/// assert!(!guard.check());
/// assert!(guard.same(&guard.clone()));
/// assert!(!guard.same(&Guard::new(|| false)));
/// ```
#[derive(Clone)]
pub struct Guard(pub(crate) Arc<Predicate>);

impl Guard {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(Predicate(Box::new(predicate))))
    }

    /// The guard that always permits retrieval
    ///
    /// This returns the same instance on every call
    pub fn always() -> Self {
        static ALWAYS: OnceLock<Guard> = OnceLock::new();
        ALWAYS.get_or_init(|| Guard::new(|| true)).clone()
    }

    /// Evaluate the predicate
    pub fn check(&self) -> bool {
        (self.0 .0)()
    }

    /// Returns true if both guards are the same instance
    pub fn same(&self, other: &Guard) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Guard {
    fn default() -> Self {
        Guard::always()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guard")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}
