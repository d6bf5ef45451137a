//! Pluggable split-point strategies.

use crate::combine::combine_samples;
use crate::error::{Result, SplitError};
use crate::observer::{SplitObserver, TracingObserver};
use crate::region::Region;
use crate::sample::{sample_region, Sample};

/// Chooses the key at which a region should be split.
pub trait SplitPointStrategy {
    /// # Errors
    ///
    /// Returns an error when no usable split point exists.
    fn split_point(&self, region: &dyn Region) -> Result<Vec<u8>>;
}

impl<S: SplitPointStrategy + ?Sized> SplitPointStrategy for &S {
    fn split_point(&self, region: &dyn Region) -> Result<Vec<u8>> {
        (**self).split_point(region)
    }
}

impl<S: SplitPointStrategy + ?Sized> SplitPointStrategy for Box<S> {
    fn split_point(&self, region: &dyn Region) -> Result<Vec<u8>> {
        (**self).split_point(region)
    }
}

/// Splits at the midpoint of the region's key range, ignoring data volume.
///
/// The start and end keys are averaged with equal weight. An unbounded end
/// is treated as all-`0xFF` at the width of the longer bound. The result is
/// left-padded back to that width so it compares correctly against the
/// bounds. If the bounds are adjacent at that width, one more byte of
/// precision is tried before giving up.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyRangeMidpointSplit;

impl KeyRangeMidpointSplit {
    fn midpoint_at_width(start: &[u8], end: &[u8], width: usize) -> Result<Vec<u8>> {
        let mut lower = start.to_vec();
        lower.resize(width, 0);
        let upper = if end.is_empty() {
            vec![0xFF; width]
        } else {
            let mut upper = end.to_vec();
            upper.resize(width, 0);
            upper
        };

        let mid = combine_samples(&[Sample::new(lower, 1), Sample::new(upper, 1)])?;
        let mut key = vec![0u8; width.saturating_sub(mid.len())];
        key.extend_from_slice(&mid);
        Ok(key)
    }
}

impl SplitPointStrategy for KeyRangeMidpointSplit {
    fn split_point(&self, region: &dyn Region) -> Result<Vec<u8>> {
        let start = region.start_key();
        let end = region.end_key();
        let width = start.len().max(end.len()).max(1);

        for w in [width, width + 1] {
            let key = Self::midpoint_at_width(start, end, w)?;
            if key.as_slice() > start && (end.is_empty() || key.as_slice() < end) {
                return Ok(key);
            }
        }

        Err(SplitError::NoSplitPoint {
            region: region.name().to_string(),
            reason: "key range has no interior key".to_string(),
        })
    }
}

/// Splits at the size-weighted mean of the region's data-file midpoints.
///
/// Every readable data file contributes its midpoint row weighted by its
/// length in bytes, so the split lands where the data actually is. When no
/// file can be sampled the decision is delegated to `fallback`.
#[derive(Debug, Clone)]
pub struct WeightedMedianSplit<F, O = TracingObserver> {
    fallback: F,
    observer: O,
}

impl<F> WeightedMedianSplit<F> {
    /// Creates the strategy, reporting progress through `tracing`.
    pub fn new(fallback: F) -> Self {
        Self {
            fallback,
            observer: TracingObserver,
        }
    }
}

impl<F, O> WeightedMedianSplit<F, O> {
    /// Replaces the observer that receives progress notifications.
    pub fn with_observer<P: SplitObserver>(self, observer: P) -> WeightedMedianSplit<F, P> {
        WeightedMedianSplit {
            fallback: self.fallback,
            observer,
        }
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl Default for WeightedMedianSplit<KeyRangeMidpointSplit> {
    fn default() -> Self {
        Self::new(KeyRangeMidpointSplit)
    }
}

impl<F, O> SplitPointStrategy for WeightedMedianSplit<F, O>
where
    F: SplitPointStrategy,
    O: SplitObserver,
{
    /// # Errors
    ///
    /// Propagates [`SplitError::ZeroTotalWeight`] when every sampled file
    /// reports length 0, and any error from the fallback.
    fn split_point(&self, region: &dyn Region) -> Result<Vec<u8>> {
        self.observer.finding_split_point(region.name());

        let samples = sample_region(region, &self.observer);
        if samples.is_empty() {
            self.observer.falling_back(region.name());
            return self.fallback.split_point(region);
        }

        self.observer.combining(samples.len());
        let key = combine_samples(&samples)?;
        self.observer.combined(&key);
        Ok(key)
    }
}
