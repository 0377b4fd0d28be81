//! Scenario tests for the reactive engine.
//!
//! Event delivery is asynchronous (each listener runs on its own consumer
//! task), so assertions about side effects poll with a deadline instead of
//! sleeping a fixed amount.

mod providers;
mod tools;

use std::time::Duration;

/// Poll `check` until it returns true or the deadline passes.
pub(crate) async fn wait_until(check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
