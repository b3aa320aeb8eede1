use std::sync::Arc;

use crate::result::Result;
use crate::state::FetchState;

/// Outcome of settling a retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Settled {
    /// The outcome was written into the state
    Applied,
    /// The outcome was dropped but the retrieval released the pending flag
    Released,
    /// The outcome was dropped and the state is unchanged
    Discarded,
}

/// The state cells of a controller
///
/// Every method is meant to be called within a single `send_if_modified` closure, which makes
/// each step atomic for observers. Methods return true if the visible state changed.
pub(super) struct Cells<T> {
    pub state: FetchState<T>,
    /// activation epoch the held state belongs to
    owner: u64,
    /// epoch of the retrieval holding the pending flag
    in_flight: Option<u64>,
}

impl<T> Cells<T> {
    pub fn new() -> Self {
        Self {
            state: FetchState::default(),
            owner: 0,
            in_flight: None,
        }
    }

    fn set_in_flight(&mut self, epoch: Option<u64>) {
        self.in_flight = epoch;
        self.state.pending = epoch.is_some();
    }

    /// Clear the held state after the guard rejected the activation
    pub fn reject(&mut self, epoch: u64, reset_pending: bool) -> bool {
        if epoch < self.owner {
            return false;
        }
        self.owner = epoch;

        let mut changed = self.state.result.take().is_some();
        changed |= self.state.failure.take().is_some();
        if reset_pending && self.in_flight.is_some() {
            self.set_in_flight(None);
            changed = true;
        }
        changed
    }

    /// Try to start a retrieval for the given epoch
    ///
    /// State held for an earlier epoch belongs to a previous configuration and is cleared. For
    /// the current epoch the retrieval only starts from a clean state.
    pub fn begin(&mut self, epoch: u64) -> bool {
        if epoch < self.owner {
            return false;
        }

        if epoch > self.owner {
            self.owner = epoch;
            self.state.result = None;
            self.state.failure = None;
        } else if !self.state.is_clean() {
            return false;
        }

        self.set_in_flight(Some(epoch));
        true
    }

    /// Write the outcome of the retrieval started for `epoch`
    ///
    /// Only the retrieval holding the pending flag for the current configuration may write its
    /// outcome, unless `discard_stale` is false, in which case the last retrieval to complete
    /// wins. Either way `pending` is only released by the retrieval holding it.
    pub fn settle(&mut self, epoch: u64, outcome: Result<T>, discard_stale: bool) -> Settled {
        let holds_pending = self.in_flight == Some(epoch);
        if discard_stale && !(holds_pending && self.owner == epoch) {
            if holds_pending {
                self.set_in_flight(None);
                return Settled::Released;
            }
            return Settled::Discarded;
        }

        match outcome {
            Ok(value) => {
                self.state.result = Some(Arc::new(value));
                self.state.failure = None;
            }
            Err(err) => {
                self.state.result = None;
                self.state.failure = Some(Arc::new(err));
            }
        }
        if holds_pending {
            self.set_in_flight(None);
        }
        Settled::Applied
    }
}

impl<T> Clone for Cells<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            owner: self.owner,
            in_flight: self.in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::state::Phase;

    #[test]
    fn it_starts_only_from_a_clean_state() {
        let mut cells: Cells<i32> = Cells::new();
        assert!(cells.begin(1));
        assert_eq!(cells.state.phase(), Phase::Pending);

        // already in flight
        assert!(!cells.begin(1));

        assert_eq!(cells.settle(1, Ok(1), true), Settled::Applied);
        assert_eq!(cells.state.phase(), Phase::Resolved);

        // result held
        assert!(!cells.begin(1));
    }

    #[test]
    fn it_clears_state_of_previous_configurations() {
        let mut cells: Cells<i32> = Cells::new();
        cells.begin(1);
        cells.settle(1, Err(Error::transport("Failed to fetch")), true);
        assert_eq!(cells.state.phase(), Phase::Rejected);

        assert!(cells.begin(2));
        assert!(cells.state.failure.is_none());
        assert!(cells.state.pending);
    }

    #[test]
    fn it_ignores_superseded_epochs() {
        let mut cells: Cells<i32> = Cells::new();
        cells.begin(2);
        assert!(!cells.begin(1));
        assert!(!cells.reject(1, true));
        assert!(cells.state.pending);
    }

    #[test]
    fn it_discards_stale_outcomes() {
        let mut cells: Cells<i32> = Cells::new();
        cells.begin(1);
        cells.begin(2);

        assert_eq!(cells.settle(1, Ok(1), true), Settled::Discarded);
        assert!(cells.state.pending);

        assert_eq!(cells.settle(2, Ok(2), true), Settled::Applied);
        assert_eq!(cells.state.result(), Some(&2));
        assert!(!cells.state.pending);
    }

    #[test]
    fn it_lets_the_last_writer_win_when_not_discarding() {
        let mut cells: Cells<i32> = Cells::new();
        cells.begin(1);
        cells.begin(2);

        assert_eq!(cells.settle(2, Ok(2), false), Settled::Applied);
        assert_eq!(cells.settle(1, Ok(1), false), Settled::Applied);
        assert_eq!(cells.state.result(), Some(&1));
    }

    #[test]
    fn it_keeps_pending_while_the_current_retrieval_runs() {
        let mut cells: Cells<i32> = Cells::new();
        cells.begin(1);
        cells.begin(2);

        // the stale outcome is written, but the second retrieval is still in flight
        assert_eq!(cells.settle(1, Ok(1), false), Settled::Applied);
        assert_eq!(cells.state.result(), Some(&1));
        assert!(cells.state.pending);
        assert_eq!(cells.state.phase(), Phase::Pending);

        assert_eq!(cells.settle(2, Ok(2), false), Settled::Applied);
        assert_eq!(cells.state.result(), Some(&2));
        assert!(!cells.state.pending);
    }

    #[test]
    fn it_resets_pending_on_reject() {
        let mut cells: Cells<i32> = Cells::new();
        cells.begin(1);
        assert!(cells.reject(2, true));
        assert_eq!(cells.state.phase(), Phase::Idle);

        assert_eq!(cells.settle(1, Ok(1), true), Settled::Discarded);
        assert_eq!(cells.state.phase(), Phase::Idle);
    }

    #[test]
    fn it_releases_pending_when_kept_on_reject() {
        let mut cells: Cells<i32> = Cells::new();
        cells.begin(1);
        cells.reject(2, false);
        assert!(cells.state.pending);

        assert_eq!(cells.settle(1, Ok(1), true), Settled::Released);
        assert_eq!(cells.state.phase(), Phase::Idle);
    }

    #[test]
    fn it_reports_no_change_when_rejecting_a_clean_state() {
        let mut cells: Cells<i32> = Cells::new();
        assert!(!cells.reject(1, true));
    }
}
