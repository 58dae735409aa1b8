use std::time::{Duration, Instant};

/// A wall-clock budget.
///
/// Every search stage receives a `Deadline` and checks it at its loop
/// boundaries. Running out of budget is not an error: the stage returns its
/// best partial result together with a timeout status.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hidato_solver::Deadline;
///
/// let total = Deadline::after(Duration::from_millis(400));
/// let stage = total.sub_budget(Duration::from_millis(160));
/// assert!(!stage.is_expired());
/// assert!(Deadline::expired().is_expired());
/// assert!(Deadline::never().remaining().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    #[must_use]
    pub const fn never() -> Self {
        Self { at: None }
    }

    /// A deadline that has already passed.
    #[must_use]
    pub fn expired() -> Self {
        Self {
            at: Some(Instant::now()),
        }
    }

    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
        }
    }

    /// Returns `true` once the deadline has passed.
    #[must_use]
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Returns the time left, or `None` for an unbounded deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Returns whichever of the two deadlines comes first.
    #[must_use]
    pub fn earliest(self, other: Self) -> Self {
        match (self.at, other.at) {
            (Some(a), Some(b)) => Self { at: Some(a.min(b)) },
            (Some(_), None) => self,
            (None, _) => other,
        }
    }

    /// Returns a deadline `budget` from now, capped by this deadline.
    #[must_use]
    pub fn sub_budget(self, budget: Duration) -> Self {
        self.earliest(Self::after(budget))
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::never()
    }
}
