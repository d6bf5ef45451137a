use super::helpers::region_config;
use crate::*;
use anyhow::Result;
use split::{
    sample_region, CellKey, KeyRangeMidpointSplit, NoopObserver, Sample, SplitError,
    SplitObserver, WeightedMedianSplit,
};
use std::cell::RefCell;
use tempfile::tempdir;

#[derive(Default)]
struct Failures(RefCell<Vec<String>>);

impl SplitObserver for Failures {
    fn file_unreadable(&self, store: &str, _file: &str, _cause: &str) {
        self.0.borrow_mut().push(store.to_string());
    }
}

fn weighted() -> WeightedMedianSplit<KeyRangeMidpointSplit, NoopObserver> {
    WeightedMedianSplit::new(KeyRangeMidpointSplit).with_observer(NoopObserver)
}

fn fill(region: &mut Region, family: &str, prefix: &str, n: u64, value_len: usize) -> Result<()> {
    for i in 0..n {
        region.put(family, format!("{}{:04}", prefix, i).into_bytes(), vec![b'v'; value_len])?;
    }
    region.flush(family)
}

#[test]
fn samples_come_from_real_midkeys_and_lengths() -> Result<()> {
    let dir = tempdir()?;
    let mut region = Region::open(&region_config(dir.path(), &["cf"], 1 << 20))?;
    fill(&mut region, "cf", "k", 11, 8)?;

    let samples = sample_region(&region, &NoopObserver);
    let file = &region.store("cf").unwrap().files()[0];
    assert_eq!(samples, vec![Sample::new(b"k0005", file.length())]);
    assert_eq!(CellKey::decode(&file.midkey()?)?.row, b"k0005");
    Ok(())
}

#[test]
fn split_point_follows_the_heavier_file() -> Result<()> {
    let dir = tempdir()?;
    let mut region = Region::open(&region_config(dir.path(), &["cf"], 1 << 20))?;
    fill(&mut region, "cf", "a", 100, 4)?;
    fill(&mut region, "cf", "z", 100, 1000)?;

    let key = region.split_point(&weighted())?;
    assert!(key.as_slice() > b"m".as_slice(), "split {:?} should lean toward z", key);
    assert!(key.as_slice() <= b"z0050".as_slice());

    // The plain midpoint of an unbounded region ignores the data entirely.
    assert_eq!(region.split_point(&KeyRangeMidpointSplit)?, vec![0x7F]);
    Ok(())
}

#[test]
fn files_in_every_store_contribute() -> Result<()> {
    let dir = tempdir()?;
    let mut region = Region::open(&region_config(dir.path(), &["left", "right"], 1 << 20))?;
    fill(&mut region, "left", "b", 50, 100)?;
    fill(&mut region, "right", "d", 50, 100)?;

    let samples = sample_region(&region, &NoopObserver);
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].key, b"b0025");
    assert_eq!(samples[1].key, b"d0025");

    let key = region.split_point(&weighted())?;
    assert!(key.as_slice() > b"b0025".as_slice());
    assert!(key.as_slice() < b"d0025".as_slice());
    Ok(())
}

#[test]
fn region_without_files_uses_key_range_midpoint() -> Result<()> {
    let dir = tempdir()?;
    let mut cfg = region_config(dir.path(), &["cf"], 1 << 20);
    cfg.start_key = b"a".to_vec();
    cfg.end_key = b"c".to_vec();
    let mut region = Region::open(&cfg)?;

    // Buffered writes are not data files.
    region.put("cf", b"a1".to_vec(), b"v".to_vec())?;
    assert_eq!(region.split_point(&weighted())?, b"b");
    Ok(())
}

#[test]
fn corrupt_file_skips_the_rest_of_its_store() -> Result<()> {
    let dir = tempdir()?;
    let mut region = Region::open(&region_config(dir.path(), &["bad", "good"], 1 << 20))?;
    fill(&mut region, "bad", "a", 1, 4)?;
    fill(&mut region, "bad", "b", 1, 4)?;
    fill(&mut region, "good", "c", 3, 4)?;

    // Corrupt the newest file of "bad" (sampled first). Its single record
    // starts at offset 0; byte 8 is inside the key.
    let newest = region.store("bad").unwrap().files()[0].path().to_path_buf();
    drop(region);
    let mut bytes = std::fs::read(&newest)?;
    bytes[8] ^= 0xFF;
    std::fs::write(&newest, &bytes)?;

    let region = Region::open(&region_config(dir.path(), &["bad", "good"], 1 << 20))?;
    let failures = Failures::default();
    let samples = sample_region(&region, &failures);

    // The older "bad" file is readable but skipped along with the corrupt one.
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].key, b"c0001");
    assert_eq!(failures.0.borrow().clone(), vec!["bad".to_string()]);
    Ok(())
}

#[test]
fn zero_weight_error_reaches_the_caller() {
    use split::{DataFile, Region as SplitRegion, SplitPointStrategy, Store as SplitStore};
    use std::io;

    struct Empty;
    impl DataFile for Empty {
        fn describe(&self) -> String {
            "empty".to_string()
        }
        fn midpoint_key(&self) -> io::Result<Vec<u8>> {
            Ok(CellKey::new(b"k".to_vec(), 1, split::CellKind::Put).encode())
        }
        fn length(&self) -> u64 {
            0
        }
    }
    struct OneFile(Empty);
    impl SplitStore for OneFile {
        fn name(&self) -> &str {
            "cf"
        }
        fn data_files(&self) -> Vec<&dyn DataFile> {
            vec![&self.0 as &dyn DataFile]
        }
    }
    struct R(OneFile);
    impl SplitRegion for R {
        fn name(&self) -> &str {
            "r"
        }
        fn start_key(&self) -> &[u8] {
            b""
        }
        fn end_key(&self) -> &[u8] {
            b""
        }
        fn stores(&self) -> Vec<&dyn SplitStore> {
            vec![&self.0 as &dyn SplitStore]
        }
    }

    let err = weighted().split_point(&R(OneFile(Empty))).unwrap_err();
    assert_eq!(err, SplitError::ZeroTotalWeight { samples: 1 });
}
