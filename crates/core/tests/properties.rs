use bitpack_bench_core::bitio::BitReader;
use bitpack_bench_core::{encode, redundancy, shannon_entropy, MAX_BYTE_ENTROPY};
use proptest::prelude::*;

proptest! {
    #[test]
    fn entropy_is_bounded(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let h = shannon_entropy(&data);
        prop_assert!((0.0..=8.0).contains(&h), "entropy {} out of range", h);
    }

    #[test]
    fn constant_bytes_have_zero_entropy(byte in any::<u8>(), len in 1usize..4096) {
        prop_assert_eq!(shannon_entropy(&vec![byte; len]), 0.0);
    }

    #[test]
    fn uniform_alphabet_entropy_is_log2_n(n in 1usize..=256, reps in 1usize..8) {
        let data: Vec<u8> = (0..reps).flat_map(|_| 0..n).map(|b| b as u8).collect();
        let expected = (n as f64).log2();
        prop_assert!((shannon_entropy(&data) - expected).abs() < 1e-9);
    }

    #[test]
    fn redundancy_matches_formula(e in 0.0f64..=8.0) {
        prop_assert!((redundancy(e, MAX_BYTE_ENTROPY) - (1.0 - e / 8.0)).abs() < 1e-12);
        prop_assert_eq!(redundancy(e, 0.0), 0.0);
    }

    #[test]
    fn encoding_is_deterministic(s in ".{0,300}") {
        prop_assert_eq!(encode(&s), encode(&s));
    }

    #[test]
    fn packed_length_matches_metadata(s in ".{1,300}") {
        let (bytes, meta) = encode(&s);
        let chars = s.chars().count();
        prop_assert!(meta.bits_per_char >= 1);
        prop_assert!(meta.padding_bits <= 7);
        prop_assert_eq!(
            bytes.len() * 8,
            chars * meta.bits_per_char as usize + meta.padding_bits as usize
        );
    }

    #[test]
    fn metadata_reverses_packing(s in ".{1,200}") {
        let (bytes, meta) = encode(&s);
        let width = meta.bits_per_char as usize;
        let data_bits = bytes.len() * 8 - meta.padding_bits as usize;

        let mut reader = BitReader::new(&bytes);
        let mut decoded = String::new();
        for _ in 0..data_bits / width {
            let code = reader.read_bits(width).unwrap() as u32;
            decoded.push(meta.table.symbol(code).unwrap());
        }
        prop_assert_eq!(decoded, s);
        // what is left is padding, and padding is zero
        let rest = reader.bits_remaining();
        prop_assert_eq!(reader.read_bits(rest).unwrap(), 0);
    }
}
