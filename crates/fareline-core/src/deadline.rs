use std::time::{Duration, Instant};

/// The per-request budget, carried as a monotonic point in time so every
/// upstream call along the pipeline is bounded by what is left of it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Time left before the deadline; zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        self.remaining().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_shrinks_and_saturates() {
        let deadline = Deadline::after(Duration::from_millis(50));
        assert!(deadline.remaining() <= Duration::from_millis(50));
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert!(deadline.is_elapsed());
    }
}
