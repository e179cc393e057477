use chrono::{DateTime, Duration, Utc};

pub const MAX_LOGIN_ATTEMPTS: i32 = 5;
pub const LOCK_DURATION_HOURS: i64 = 2;

/// Counter and lock state after one failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedLogin {
    pub attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
}

/// An expired lock restarts the count at 1. Reaching the maximum locks
/// the account for two hours.
pub fn register_failure(
    attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> FailedLogin {
    if lock_until.is_some_and(|until| until <= now) {
        return FailedLogin {
            attempts: 1,
            lock_until: None,
        };
    }
    let attempts = attempts + 1;
    let lock_until = if attempts >= MAX_LOGIN_ATTEMPTS && lock_until.is_none() {
        Some(now + Duration::hours(LOCK_DURATION_HOURS))
    } else {
        lock_until
    };
    FailedLogin {
        attempts,
        lock_until,
    }
}
