use super::helpers::count_sst_files;
use crate::*;
use anyhow::Result;
use split::Store as _;
use tempfile::tempdir;

#[test]
fn put_get_delete_in_buffer() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("cf"), 1 << 20)?;
    assert_eq!(store.name(), "cf");

    store.put(b"k".to_vec(), b"v".to_vec())?;
    assert_eq!(store.get(b"k")?, Some((1, b"v".to_vec())));

    store.delete(b"k".to_vec())?;
    assert_eq!(store.get(b"k")?, None);
    assert_eq!(store.seq(), 2);
    assert_eq!(store.file_count(), 0);
    Ok(())
}

#[test]
fn flush_writes_a_file_and_reads_still_work() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("cf");
    let mut store = Store::open(&path, 1 << 20)?;

    store.put(b"a".to_vec(), b"1".to_vec())?;
    store.put(b"b".to_vec(), b"2".to_vec())?;
    store.flush()?;

    assert_eq!(store.file_count(), 1);
    assert_eq!(store.buffered_entries(), 0);
    assert_eq!(count_sst_files(&path), 1);
    assert_eq!(store.get(b"b")?, Some((2, b"2".to_vec())));
    assert_eq!(store.total_bytes(), std::fs::metadata(store.files()[0].path())?.len());
    Ok(())
}

#[test]
fn flush_of_empty_buffer_is_noop() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("cf"), 1 << 20)?;
    store.flush()?;
    assert_eq!(store.file_count(), 0);
    Ok(())
}

#[test]
fn threshold_triggers_automatic_flush() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("cf"), 64)?;

    for i in 0..20u64 {
        store.put(format!("k{:04}", i).into_bytes(), b"some-value".to_vec())?;
    }
    assert!(store.file_count() > 1, "expected several flushes");
    for i in 0..20u64 {
        assert!(store.get(&format!("k{:04}", i).into_bytes())?.is_some());
    }
    Ok(())
}

#[test]
fn tombstone_in_newer_file_shadows_older_value() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("cf"), 1 << 20)?;

    store.put(b"k".to_vec(), b"v".to_vec())?;
    store.flush()?;
    store.delete(b"k".to_vec())?;
    store.flush()?;

    assert_eq!(store.file_count(), 2);
    assert_eq!(store.get(b"k")?, None);
    Ok(())
}

#[test]
fn reopen_recovers_files_newest_first_and_seq() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("cf");
    {
        let mut store = Store::open(&path, 1 << 20)?;
        store.put(b"k".to_vec(), b"old".to_vec())?;
        store.flush()?;
        store.put(b"k".to_vec(), b"new".to_vec())?;
        store.flush()?;
    }

    let mut store = Store::open(&path, 1 << 20)?;
    assert_eq!(store.file_count(), 2);
    assert_eq!(store.seq(), 2);
    assert_eq!(store.get(b"k")?, Some((2, b"new".to_vec())));
    assert!(store.files()[0].max_seq() > store.files()[1].max_seq());

    store.put(b"x".to_vec(), b"y".to_vec())?;
    assert_eq!(store.seq(), 3);
    Ok(())
}

#[test]
fn leftover_tmp_files_are_removed_on_open() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("cf");
    std::fs::create_dir_all(&path)?;
    let tmp = path.join("sst-00000000000000000001-1.sst.tmp");
    std::fs::write(&tmp, b"partial")?;

    let store = Store::open(&path, 1 << 20)?;
    assert!(!tmp.exists());
    assert_eq!(store.file_count(), 0);
    Ok(())
}

#[test]
fn invalid_keys_and_values_are_rejected() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("cf"), 1 << 20)?;

    assert!(store.put(Vec::new(), b"v".to_vec()).is_err());
    assert!(store.put(vec![b'k'; MAX_KEY_SIZE + 1], b"v".to_vec()).is_err());
    assert!(store.put(b"k".to_vec(), vec![0; MAX_VALUE_SIZE + 1]).is_err());
    assert!(store.delete(Vec::new()).is_err());
    assert_eq!(store.seq(), 0, "rejected writes must not consume a sequence number");
    Ok(())
}

#[test]
fn data_files_are_exposed_newest_first() -> Result<()> {
    let dir = tempdir()?;
    let mut store = Store::open(dir.path().join("cf"), 1 << 20)?;
    store.put(b"a".to_vec(), b"1".to_vec())?;
    store.flush()?;
    store.put(b"b".to_vec(), vec![b'x'; 1000])?;
    store.flush()?;

    let files = store.data_files();
    assert_eq!(files.len(), 2);
    assert!(files[0].length() > files[1].length());
    Ok(())
}

#[test]
fn corrupt_footer_fails_open_and_names_the_table() -> Result<()> {
    let dir = tempdir()?;
    let store_dir = dir.path().join("cf");
    let path = {
        let mut store = Store::open(&store_dir, 1 << 20)?;
        store.put(b"k".to_vec(), b"v".to_vec())?;
        store.flush()?;
        store.files()[0].path().to_path_buf()
    };

    // The magic is the last four bytes of the footer.
    let mut bytes = std::fs::read(&path)?;
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&path, &bytes)?;

    let err = Store::open(&store_dir, 1 << 20).unwrap_err();
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(format!("{:#}", err).contains(&file_name), "{:#}", err);

    let cfg = super::helpers::region_config(dir.path(), &["cf"], 1 << 20);
    assert!(Region::open(&cfg).is_err());
    Ok(())
}
