use thiserror::Error;

/// Errors produced while computing a split point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// `combine_samples` was handed an empty list.
    #[error("no samples to combine")]
    NoSamples,

    /// Samples were collected but every one of them has weight 0, so the
    /// weighted mean is undefined.
    #[error("total sample weight is zero ({samples} samples)")]
    ZeroTotalWeight { samples: usize },

    /// No key strictly inside the region's range could be produced.
    #[error("no split point for region {region}: {reason}")]
    NoSplitPoint { region: String, reason: String },

    /// A structured cell key could not be decoded.
    #[error("malformed cell key: {0}")]
    MalformedKey(String),
}

pub type Result<T> = std::result::Result<T, SplitError>;
