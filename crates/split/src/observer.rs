//! Diagnostics sink for the split computation.
//!
//! The sampler and the strategies report what they are doing through a
//! [`SplitObserver`] handed to them by the caller. The default,
//! [`TracingObserver`], turns each notification into a `tracing` event; the
//! host decides where those go by installing a subscriber.

use tracing::{error, info};

/// Receives progress notifications from the sampler and strategies.
///
/// Every method has an empty default so implementors only override what
/// they care about.
pub trait SplitObserver {
    /// A split point is about to be computed for `region`.
    fn finding_split_point(&self, _region: &str) {}

    /// The sampler started walking `region`.
    fn sampling_region(&self, _region: &str) {}

    /// `file` in `store` could not be sampled; the rest of the store is skipped.
    fn file_unreadable(&self, _store: &str, _file: &str, _cause: &str) {}

    /// No samples were collected and the fallback strategy is taking over.
    fn falling_back(&self, _region: &str) {}

    /// `count` samples are being combined.
    fn combining(&self, _count: usize) {}

    /// The combiner produced `key`.
    fn combined(&self, _key: &[u8]) {}
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SplitObserver for NoopObserver {}

/// Forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SplitObserver for TracingObserver {
    fn finding_split_point(&self, region: &str) {
        info!(region, "finding split point");
    }

    fn sampling_region(&self, region: &str) {
        info!(region, "sampling region");
    }

    fn file_unreadable(&self, store: &str, file: &str, cause: &str) {
        error!(store, file, cause, "problem reading data file; skipping rest of store");
    }

    fn falling_back(&self, region: &str) {
        info!(region, "no data files sampled, reverting to fallback split point");
    }

    fn combining(&self, count: usize) {
        info!(count, "combining samples");
    }

    fn combined(&self, key: &[u8]) {
        info!(
            key = %String::from_utf8_lossy(key),
            len = key.len(),
            "combined split point"
        );
    }
}

impl<T: SplitObserver + ?Sized> SplitObserver for &T {
    fn finding_split_point(&self, region: &str) {
        (**self).finding_split_point(region)
    }

    fn sampling_region(&self, region: &str) {
        (**self).sampling_region(region)
    }

    fn file_unreadable(&self, store: &str, file: &str, cause: &str) {
        (**self).file_unreadable(store, file, cause)
    }

    fn falling_back(&self, region: &str) {
        (**self).falling_back(region)
    }

    fn combining(&self, count: usize) {
        (**self).combining(count)
    }

    fn combined(&self, key: &[u8]) {
        (**self).combined(key)
    }
}
