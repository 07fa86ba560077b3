//! Cancellable one-shot timers for the elevator state machine.
//!
//! A [Timer] only holds a deadline. [Timer::wait] is meant to be raced inside a
//! `tokio::select!`: it completes once the deadline is reached, and never completes while the
//! timer is stopped. Starting a running timer moves its deadline, so an old deadline can never
//! fire after a restart.

use tokio::time::{sleep_until, Duration, Instant};


/// One-shot timer with a fixed timeout
#[derive(Debug, Clone)]
pub struct Timer {
    timeout_duration: Duration,
    deadline: Option<Instant>,
}

/// Creates a stopped timer
pub fn new(timeout_duration: Duration) -> Timer {
    Timer {
        timeout_duration,
        deadline: None,
    }
}

impl Timer {
    /// Arms the timer `timeout_duration` from now, replacing any pending deadline
    pub fn timer_start(&mut self) {
        self.deadline = Some(Instant::now() + self.timeout_duration);
    }

    /// Cancels the pending deadline, if any
    pub fn timer_stop(&mut self) {
        self.deadline = None;
    }

    /// `true` while a deadline is pending
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// `true` if the timer is armed and its deadline has passed
    pub fn timer_timeouted(&self) -> bool {
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Completes when the deadline is reached. Pends forever on a stopped timer.
    pub async fn wait(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}
