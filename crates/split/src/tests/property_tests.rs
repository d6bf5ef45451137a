use crate::*;
use num_bigint::BigUint;
use proptest::prelude::*;

/// Independent reference: shift instead of pad, and sum weights separately.
fn reference_mean(samples: &[Sample]) -> BigUint {
    let max_len = samples.iter().map(|s| s.key.len()).max().unwrap_or(0);
    let mut num = BigUint::from(0u8);
    let mut den = BigUint::from(0u8);
    for s in samples {
        let shift = 8 * (max_len - s.key.len());
        let value = BigUint::from_bytes_be(&s.key) << shift;
        num += value * BigUint::from(s.weight);
        den += BigUint::from(s.weight);
    }
    num / den
}

fn arb_large_weight() -> impl Strategy<Value = u64> {
    prop_oneof![
        (1u64 << 62)..=u64::MAX,
        1u64..=1_000_000,
    ]
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    (prop::collection::vec(any::<u8>(), 0..40), arb_large_weight())
        .prop_map(|(key, weight)| Sample::new(key, weight))
}

fn arb_long_sample() -> impl Strategy<Value = Sample> {
    (prop::collection::vec(any::<u8>(), 16..64), (1u64 << 63)..=u64::MAX)
        .prop_map(|(key, weight)| Sample::new(key, weight))
}

proptest! {
    #[test]
    fn combine_matches_reference(samples in prop::collection::vec(arb_sample(), 1..16)) {
        let combined = combine_samples(&samples).unwrap();
        prop_assert_eq!(decode_magnitude(&combined), reference_mean(&samples));
    }

    #[test]
    fn long_keys_with_huge_weights_do_not_overflow(
        samples in prop::collection::vec(arb_long_sample(), 1..32)
    ) {
        let combined = combine_samples(&samples).unwrap();
        prop_assert_eq!(decode_magnitude(&combined), reference_mean(&samples));
    }

    #[test]
    fn result_never_longer_than_longest_key(samples in prop::collection::vec(arb_sample(), 1..16)) {
        let max_len = samples.iter().map(|s| s.key.len()).max().unwrap();
        let combined = combine_samples(&samples).unwrap();
        prop_assert!(combined.len() <= max_len);
    }

    #[test]
    fn identical_values_are_a_fixed_point(
        key in prop::collection::vec(any::<u8>(), 1..24),
        weights in prop::collection::vec(1u64..=u64::MAX, 1..8),
        extra_zeros in 0usize..4,
    ) {
        // The same magnitude spelled with and without trailing padding.
        let mut samples: Vec<Sample> = weights.iter().map(|w| Sample::new(key.clone(), *w)).collect();
        if extra_zeros > 0 {
            let mut padded = key.clone();
            padded.resize(key.len() + extra_zeros, 0);
            for s in &mut samples {
                s.key = padded.clone();
            }
            samples.push(Sample::new(key.clone(), 1));
        }
        let max_len = samples.iter().map(|s| s.key.len()).max().unwrap();
        let mut expected = key.clone();
        expected.resize(max_len, 0);

        let combined = combine_samples(&samples).unwrap();
        prop_assert_eq!(combined, encode_magnitude(&decode_magnitude(&expected)));
    }

    #[test]
    fn minimal_encoding_round_trips(bytes in prop::collection::vec(any::<u8>(), 0..48)) {
        let value = decode_magnitude(&bytes);
        let encoded = encode_magnitude(&value);
        prop_assert_eq!(decode_magnitude(&encoded), value.clone());
        if value != BigUint::from(0u8) {
            prop_assert_ne!(encoded[0], 0x00);
        } else {
            prop_assert!(encoded.is_empty());
        }
    }

    #[test]
    fn cell_key_row_survives_encoding(
        row in prop::collection::vec(any::<u8>(), 0..128),
        seq in any::<u64>(),
    ) {
        let encoded = CellKey::new(row.clone(), seq, CellKind::Put).encode();
        prop_assert_eq!(CellKey::row_of(&encoded).unwrap(), row.as_slice());
    }
}
