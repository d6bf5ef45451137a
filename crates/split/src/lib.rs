//! # Split - size-weighted split points
//!
//! Chooses the key at which a region should be divided so that both halves
//! hold roughly the same amount of on-disk data.
//!
//! ## How it works
//!
//! ```text
//! Region
//!   ├── Store "default"   sst-3 (midkey "m", 40 KiB)   sst-1 (midkey "c", 10 KiB)
//!   └── Store "meta"      sst-2 (midkey "x", 50 KiB)
//!            |
//!            v   sample_region()        one (row key, file length) per file
//! [("m", 40960), ("c", 10240), ("x", 51200)]
//!            |
//!            v   combine_samples()      size-weighted mean of big-endian magnitudes
//! split point
//! ```
//!
//! Keys are compared as unsigned big-endian integers. Shorter keys are padded
//! on the right with zero bytes before averaging, which keeps the numeric
//! order identical to the byte-wise order used everywhere else in the key
//! space. All arithmetic is exact ([`num_bigint::BigUint`]), so neither long
//! keys nor huge file sizes can overflow.
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                  |
//! |--------------|----------------------------------------------------------|
//! | [`key`]      | `CellKey` codec: the structured midpoint key of a file   |
//! | [`region`]   | `Region` / `Store` / `DataFile` traits the host implements |
//! | [`sample`]   | `Sample` and the per-store sampling walk                 |
//! | [`combine`]  | Weighted combination of samples into one key             |
//! | [`strategy`] | `SplitPointStrategy` and its two implementations         |
//! | [`observer`] | Injected progress/diagnostics sink (`tracing` by default) |
//! | [`error`]    | `SplitError`                                             |
mod combine;
mod error;
mod key;
mod observer;
mod region;
mod sample;
mod strategy;

pub use combine::{combine_samples, decode_magnitude, encode_magnitude};
pub use error::{Result, SplitError};
pub use key::{CellKey, CellKind, CELL_KEY_PREFIX_BYTES, CELL_KEY_TRAILER_BYTES};
pub use observer::{NoopObserver, SplitObserver, TracingObserver};
pub use region::{DataFile, Region, Store};
pub use sample::{sample_region, Sample};
pub use strategy::{KeyRangeMidpointSplit, SplitPointStrategy, WeightedMedianSplit};

#[cfg(test)]
mod tests;
