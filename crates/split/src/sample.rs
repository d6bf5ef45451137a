use crate::key::CellKey;
use crate::observer::SplitObserver;
use crate::region::Region;

/// One observation: a data file's midpoint row weighted by the file's size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub key: Vec<u8>,
    pub weight: u64,
}

impl Sample {
    pub fn new(key: impl Into<Vec<u8>>, weight: u64) -> Self {
        Self {
            key: key.into(),
            weight,
        }
    }
}

/// Collects one [`Sample`] per readable data file in `region`.
///
/// Stores are walked in the region's order and files in each store's order.
/// When a file's midpoint cannot be read or its cell key does not decode,
/// the observer is told and the **remaining files of that store are
/// skipped**; later stores are still sampled.
///
/// Returns an empty list when the region has no files or none could be read.
pub fn sample_region<O: SplitObserver + ?Sized>(region: &dyn Region, observer: &O) -> Vec<Sample> {
    observer.sampling_region(region.name());

    let mut samples = Vec::new();
    for store in region.stores() {
        for file in store.data_files() {
            let midkey = match file.midpoint_key() {
                Ok(k) => k,
                Err(e) => {
                    observer.file_unreadable(store.name(), &file.describe(), &e.to_string());
                    break;
                }
            };
            let row = match CellKey::row_of(&midkey) {
                Ok(r) => r,
                Err(e) => {
                    observer.file_unreadable(store.name(), &file.describe(), &e.to_string());
                    break;
                }
            };
            samples.push(Sample::new(row, file.length()));
        }
    }
    samples
}
