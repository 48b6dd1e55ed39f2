//! Tokio-backed [`TerminalClock`].

use std::time::Duration;

use site_host::{ClockFuture, TerminalClock};

#[derive(Debug, Clone, Copy, Default)]
/// Wall-clock timer backed by `tokio::time::sleep`.
pub struct TokioClock;

impl TerminalClock for TokioClock {
    fn sleep(&self, duration: Duration) -> ClockFuture {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_sleep_completes() {
        TokioClock.sleep(Duration::ZERO).await;
    }
}
