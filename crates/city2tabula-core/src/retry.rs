use std::time::Duration;

/// Classification of a database error, used to pick between the general and
/// deadlock-aware retry policies (spec §4.8/§5).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DbErrorClass {
    Deadlock,
    Other,
}

/// Postgres SQLSTATE for "deadlock_detected".
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";
/// Postgres SQLSTATE for "serialization_failure", also retried under the deadlock policy
/// since it arises from the same class of concurrent-transaction contention.
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

impl DbErrorClass {
    /// Classifies a `sqlx::Error`. Prefers the driver-reported SQLSTATE; falls back to a
    /// case-insensitive substring match on the message when no code is available, per
    /// spec §9's guidance ("prefer matching on the DBMS's standardised code; fall back
    /// to substring").
    pub fn classify(err: &sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = err {
            if let Some(code) = db_err.code() {
                if code == SQLSTATE_DEADLOCK_DETECTED || code == SQLSTATE_SERIALIZATION_FAILURE {
                    return DbErrorClass::Deadlock;
                }
            }
        }
        if err.to_string().to_lowercase().contains("deadlock") {
            return DbErrorClass::Deadlock;
        }
        DbErrorClass::Other
    }
}

/// A tunable retry policy: how many attempts to allow, and how long to wait before
/// attempt `k` (0-indexed, i.e. the delay before the *first* retry is `delay_for_attempt(0)`).
pub trait RetryPolicy: Send + Sync {
    fn max_attempts(&self) -> u32;
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
}

/// Exponential backoff used for non-deadlock errors (spec §4.8). Delay before attempt
/// `k` is `initial_delay * backoff_factor^k`, capped at `max_delay`.
#[derive(Clone, Copy, Debug)]
pub struct GeneralRetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for GeneralRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy for GeneralRetryPolicy {
    fn max_attempts(&self) -> u32 {
        self.max_retries
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }
}

/// Short-jittered retry used when the runner classifies an error as a deadlock (spec
/// §4.8/§5). Delay before attempt `k` is `50ms + k*25ms`, plus jitter uniform in
/// `[0, 100ms)`, capped at `max_delay`.
#[derive(Clone, Copy, Debug)]
pub struct DeadlockRetryPolicy {
    pub deadlock_retries: u32,
    pub base_delay: Duration,
    pub step_delay: Duration,
    pub max_jitter: Duration,
    pub max_delay: Duration,
}

impl Default for DeadlockRetryPolicy {
    fn default() -> Self {
        Self {
            deadlock_retries: 5,
            base_delay: Duration::from_millis(50),
            step_delay: Duration::from_millis(25),
            max_jitter: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy for DeadlockRetryPolicy {
    fn max_attempts(&self) -> u32 {
        self.deadlock_retries
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay + self.step_delay * attempt;
        // Jitter uniform in [0, max_jitter), matching the teacher's dequeue-interval
        // jitter pattern (`rand::random::<f64>()` scaled into a bounded range).
        let jitter = self.max_jitter.mul_f64(rand::random::<f64>());
        (base + jitter).min(self.max_delay)
    }
}
