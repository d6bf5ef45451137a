
use crate::Cell;

/// `a` -> apple, `b` -> banana, `c` -> "", `d` tombstone.
pub(crate) fn sample_cells() -> Vec<(Vec<u8>, Cell)> {
    vec![
        (b"a".to_vec(), Cell::put(1, b"apple".to_vec())),
        (b"b".to_vec(), Cell::put(2, b"banana".to_vec())),
        (b"c".to_vec(), Cell::put(3, b"".to_vec())),
        (b"d".to_vec(), Cell::tombstone(4)),
    ]
}

pub(crate) fn numbered_cells(n: u64) -> Vec<(Vec<u8>, Cell)> {
    (0..n)
        .map(|i| (format!("k{:04}", i).into_bytes(), Cell::put(i + 1, b"v".to_vec())))
        .collect()
}
