use std::time::Duration;

use tracing::warn;

use super::locators::READY_MARKER;
use crate::browser::PageBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Marker never showed up; extraction runs on whatever rendered.
    TimedOut,
    /// Navigation failed, so there was nothing to wait for.
    NotLoaded,
}

/// Wait for the page's main content. Never fails the caller.
pub async fn await_ready<B: PageBackend>(page: &mut B, url: &str, timeout: Duration) -> Readiness {
    match page.wait_until_visible(&READY_MARKER, timeout).await {
        Ok(()) => Readiness::Ready,
        Err(e) => {
            warn!(
                "Timeout: {} not ready after {:.1}s ({})",
                url,
                timeout.as_secs_f64(),
                e
            );
            Readiness::TimedOut
        }
    }
}
