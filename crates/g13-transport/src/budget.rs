//! Consecutive recoverable error budget.

/// Counts consecutive recoverable transport errors.
///
/// The budget is exhausted once the count exceeds the limit, so a limit of
/// 5 tolerates five errors in a row and the sixth is fatal. Any good report
/// resets the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorBudget {
    limit: u32,
    consecutive: u32,
}

impl ErrorBudget {
    pub const DEFAULT_LIMIT: u32 = 5;

    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive: 0,
        }
    }

    /// Charge one recoverable error. Returns `true` once exhausted.
    pub fn record_recoverable(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.is_exhausted()
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.consecutive > self.limit
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}
