// ── Error reporting ──
//
// Refresh failures leave the loop through an injected sink instead of the
// snapshot stream. The loop keeps going after every report.

use std::sync::Arc;

use tracing::warn;

use crate::error::DiscoveryError;

/// Out-of-band sink for refresh failures.
///
/// Called from the discovery loop; implementations must not block.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &DiscoveryError);
}

/// Logs refresh failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &DiscoveryError) {
        warn!(error = %error, "EC2 discovery refresh failed");
    }
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for Arc<T> {
    fn report(&self, error: &DiscoveryError) {
        (**self).report(error);
    }
}
