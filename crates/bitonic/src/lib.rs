//! In-register bitonic sort for short arrays of fixed-width integers.
//!
//! Up to [`MAX_REGISTERS`] vector registers are loaded, sorted by an
//! oblivious bitonic network and stored back. A length that is not a
//! multiple of the register width is padded with sentinel lanes that never
//! reach memory; see [`Tagging`] for how padding is kept behind real values.

mod dispatch;
mod driver;
mod error;
pub mod network;
pub mod ops;
mod options;
mod partial;
mod tagging;

use std::ops::RangeInclusive;

pub use dispatch::SimdSort;
pub use error::SortError;
pub use network::{Ascending, Descending, Direction};
pub use ops::{Access, Aligned, Lane, Portable, SimdOps, Streaming, Unaligned};
pub use options::{Order, SortOptions, Tagging};
pub use tagging::tag_bits;

/// Registers one call can hold.
pub const MAX_REGISTERS: usize = 32;

/// Largest slice [`sort`] accepts for `T`.
pub fn capacity<T: SimdSort>() -> usize {
    T::PACKING * MAX_REGISTERS
}

/// Values [`sort`] handles for a `len`-element input with [`Tagging::InLane`].
///
/// The full range of `T` when `len` fills whole registers; otherwise every
/// value is shifted left by the tag width while sorting and must fit.
pub fn tag_domain<T: SimdSort>(len: usize) -> RangeInclusive<T> {
    tagging::tag_domain::<T>(driver::tail_tag_bits(len, T::PACKING, Tagging::InLane))
}

/// Sorts `data` ascending with [`Tagging::InLane`].
///
/// Values must lie in [`tag_domain`]`(data.len())`. Release builds do not
/// check this and corrupt values outside it: `[i32::MAX, 0, 1]` comes back
/// as `[-1, 0, 1]`. Use [`try_sort`] to reject such input, or
/// [`Tagging::Disabled`] to sort the full range.
///
/// # Panics
///
/// If `data.len() > capacity::<T>()`. Debug builds also panic on values
/// outside [`tag_domain`].
pub fn sort<T: SimdSort>(data: &mut [T]) {
    sort_with(data, SortOptions::default());
}

pub fn sort_with<T: SimdSort>(data: &mut [T], options: SortOptions) {
    T::sort_slice(data, &options);
}

/// Like [`sort_with`], rejecting inputs it cannot sort instead of panicking.
pub fn try_sort<T: SimdSort>(data: &mut [T], options: SortOptions) -> Result<(), SortError> {
    let capacity = capacity::<T>();
    if data.len() > capacity {
        return Err(SortError::CapacityExceeded {
            len: data.len(),
            capacity,
        });
    }

    let bits = driver::tail_tag_bits(data.len(), T::PACKING, options.tagging);
    if let Some(index) = tagging::first_outside_domain(data, bits) {
        return Err(SortError::TagWidthExceeded { index, bits });
    }

    sort_with(data, options);
    Ok(())
}

/// Sorts the sequence `get(0), ..., get(len - 1)` and hands the result to
/// `set`. Both are called exactly once per index, in increasing order, and
/// every `get` happens before the first `set`.
pub fn sort_by_index<T, G, S>(len: usize, get: G, set: S, options: SortOptions)
where
    T: SimdSort,
    G: FnMut(usize) -> T,
    S: FnMut(usize, T),
{
    T::sort_by_index(len, get, set, &options);
}

/// Sorts with a caller-chosen backend, skipping CPU detection.
///
/// # Panics
///
/// If `data.len()` exceeds `O::PACKING * MAX_REGISTERS`.
pub fn sort_with_ops<O: SimdOps>(data: &mut [O::Lane], options: SortOptions) {
    driver::sort_slice::<O>(data, &options);
}

#[cfg(test)]
mod tests {
    use rand::distr::{Distribution, StandardUniform};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    const POISON: usize = 8;

    /// Sorts `data[..len]` inside a poisoned buffer and compares with std.
    fn assert_sorts_like_std<T: SimdSort>(data: &[T], options: SortOptions, guard: T) {
        let len = data.len();
        let mut buffer = data.to_vec();
        buffer.extend(std::iter::repeat_n(guard, POISON));

        sort_with(&mut buffer[..len], options);

        let mut expected = data.to_vec();
        expected.sort_unstable();
        if options.order == Order::Descending {
            expected.reverse();
        }
        assert_eq!(
            buffer[..len],
            expected[..],
            "backend={} len={} {:?}",
            T::backend(),
            len,
            options
        );
        assert!(buffer[len..].iter().all(|&x| x == guard), "len={len} wrote past the end");
    }

    fn random_in_domain<T, R>(rng: &mut R, len: usize) -> Vec<T>
    where
        T: SimdSort,
        R: Rng,
        StandardUniform: Distribution<T>,
    {
        let bits = driver::tail_tag_bits(len, T::PACKING, Tagging::InLane);
        (0..len).map(|_| rng.random::<T>() >> bits).collect()
    }

    fn check_type<T>(seed: u64)
    where
        T: SimdSort,
        StandardUniform: Distribution<T>,
    {
        let mut rng = StdRng::seed_from_u64(seed);
        for len in 1..=capacity::<T>() {
            let data = random_in_domain::<T, _>(&mut rng, len);
            assert_sorts_like_std(&data, SortOptions::default(), T::MIN);
            assert_sorts_like_std(&data, SortOptions::descending(), T::MAX);

            let full: Vec<T> = (0..len).map(|_| rng.random()).collect();
            let disabled = SortOptions::default().tagging(Tagging::Disabled);
            assert_sorts_like_std(&full, disabled, T::MIN);
            assert_sorts_like_std(&full, disabled.order(Order::Descending), T::MAX);
        }
    }

    #[test]
    fn every_type_every_length() {
        check_type::<i16>(0x5EED_2016);
        check_type::<u16>(0x5EED_2116);
        check_type::<i32>(0x5EED_2032);
        check_type::<u32>(0x5EED_2132);
        check_type::<i64>(0x5EED_2064);
        check_type::<u64>(0x5EED_2164);
    }

    #[test]
    fn reversed_nine_with_guard() {
        let mut buffer = [9, 8, 7, 6, 5, 4, 3, 2, 1, 999];
        sort(&mut buffer[..9]);
        assert_eq!(buffer, [1, 2, 3, 4, 5, 6, 7, 8, 9, 999]);
    }

    #[test]
    fn empty_is_a_no_op() {
        let mut data: [u32; 0] = [];
        sort(&mut data);
        assert_eq!(try_sort(&mut data, SortOptions::default()), Ok(()));
        sort_by_index::<u32, _, _>(0, |_| unreachable!(), |_, _| unreachable!(), SortOptions::default());
    }

    #[test]
    fn edge_lengths() {
        let p = <i32 as SimdSort>::PACKING;
        for len in [1, p, p + 1, capacity::<i32>()] {
            let data: Vec<i32> = (0..len as i32).rev().map(|x| x * 7 - 100).collect();
            assert_sorts_like_std(&data, SortOptions::default(), -1);
        }
    }

    #[test]
    fn sorted_and_duplicated_inputs_stay_put() {
        for len in 1..=capacity::<u64>() {
            let ascending: Vec<u64> = (1..=len as u64).collect();
            let mut data = ascending.clone();
            sort(&mut data);
            assert_eq!(data, ascending);

            let halves: Vec<u64> = (0..len as u64).map(|i| i / 2 + 1).collect();
            let mut data = halves.clone();
            sort(&mut data);
            assert_eq!(data, halves);
        }
    }

    #[test]
    fn idempotent() {
        let mut rng = StdRng::seed_from_u64(0x1D3_2026);
        for len in [3, 17, 100, 255] {
            let mut data: Vec<i16> = (0..len).map(|_| rng.random_range(-100..100)).collect();
            sort(&mut data);
            let once = data.clone();
            sort(&mut data);
            assert_eq!(data, once);
        }
    }

    fn assert_zero_one(len: usize, bits: u32) {
        let mut data: Vec<i32> = (0..len).map(|i| ((bits >> i) & 1) as i32).collect();
        sort(&mut data);
        let zeros = len - bits.count_ones() as usize;
        assert!(data[..zeros].iter().all(|&x| x == 0), "len={len} bits={bits:b}");
        assert!(data[zeros..].iter().all(|&x| x == 1), "len={len} bits={bits:b}");
    }

    #[test]
    fn zero_one_inputs() {
        for len in 1..=16 {
            for bits in 0u32..(1 << len) {
                assert_zero_one(len, bits);
            }
        }

        let mut rng = StdRng::seed_from_u64(0x2E0_2026);
        for len in 17..32 {
            for _ in 0..4096 {
                assert_zero_one(len, rng.random::<u32>() & ((1 << len) - 1));
            }
        }
    }

    #[test]
    fn extremes_without_tagging() {
        let options = SortOptions::default().tagging(Tagging::Disabled);
        let mut data = [i64::MAX, i64::MIN, 0, i64::MAX, -1, i64::MIN, 1];
        sort_with(&mut data, options);
        assert_eq!(data, [i64::MIN, i64::MIN, -1, 0, 1, i64::MAX, i64::MAX]);

        let mut data = [u16::MAX, 0, u16::MAX, 7, 0];
        sort_with(&mut data, options.order(Order::Descending));
        assert_eq!(data, [u16::MAX, u16::MAX, 7, 0, 0]);
    }

    #[test]
    fn domain_edges_with_tagging() {
        let len = 13;
        let domain = tag_domain::<i32>(len);
        let (lo, hi) = (*domain.start(), *domain.end());
        let mut data: Vec<i32> = (0..len as i32).map(|i| if i % 2 == 0 { hi } else { lo }).collect();
        sort(&mut data);
        assert!(data[..6].iter().all(|&x| x == lo));
        assert!(data[6..].iter().all(|&x| x == hi));

        assert_eq!(tag_domain::<u32>(16), 0..=u32::MAX);
    }

    #[test]
    fn try_sort_rejects_bad_input() {
        let mut too_long = vec![0u32; capacity::<u32>() + 1];
        assert_eq!(
            try_sort(&mut too_long, SortOptions::default()),
            Err(SortError::CapacityExceeded { len: 257, capacity: 256 })
        );

        let mut wide = [1, 2, i32::MAX, 4, 5];
        assert_eq!(
            try_sort(&mut wide, SortOptions::default()),
            Err(SortError::TagWidthExceeded { index: 2, bits: 3 })
        );
        assert_eq!(wide, [1, 2, i32::MAX, 4, 5]);

        let mut three = [i32::MAX, 0, 1];
        assert!(!tag_domain::<i32>(three.len()).contains(&i32::MAX));
        assert_eq!(
            try_sort(&mut three, SortOptions::default()),
            Err(SortError::TagWidthExceeded { index: 0, bits: 3 })
        );
        sort_with(&mut three, SortOptions::default().tagging(Tagging::Disabled));
        assert_eq!(three, [0, 1, i32::MAX]);

        try_sort(&mut wide, SortOptions::default().tagging(Tagging::Disabled)).unwrap();
        assert_eq!(wide, [1, 2, 4, 5, i32::MAX]);

        let mut whole = [i32::MAX, i32::MIN, 0, 3, 2, 1, -1, -2];
        try_sort(&mut whole, SortOptions::default()).unwrap();
        assert_eq!(whole, [i32::MIN, -2, -1, 0, 1, 2, 3, i32::MAX]);
    }

    #[test]
    fn callbacks_sort_a_foreign_layout() {
        // Keys stored as the first field of wider records.
        let mut records: Vec<(u32, &str)> =
            vec![(30, "c"), (10, "a"), (50, "e"), (20, "b"), (40, "d")];
        let keys: Vec<u32> = records.iter().map(|r| r.0).collect();
        let mut gets = Vec::new();
        sort_by_index(
            records.len(),
            |i| {
                gets.push(i);
                keys[i]
            },
            |i, key| records[i].0 = key,
            SortOptions::descending(),
        );
        assert_eq!(gets, [0, 1, 2, 3, 4]);
        let sorted: Vec<u32> = records.iter().map(|r| r.0).collect();
        assert_eq!(sorted, [50, 40, 30, 20, 10]);
    }

    #[test]
    fn explicit_portable_backend() {
        let mut data = [5i64, -3, 9, 0, 2, 2, -8];
        sort_with_ops::<Portable<i64, 4>>(&mut data, SortOptions::default());
        assert_eq!(data, [-8, -3, 0, 2, 2, 5, 9]);

        let mut data = [5i32, -3, 9, 0, 2];
        sort_with_ops::<Portable<i32, 4>>(&mut data, SortOptions::descending());
        assert_eq!(data, [9, 5, 2, 0, -3]);
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::*;

        fn in_domain_i32() -> impl Strategy<Value = Vec<i32>> {
            (1..=capacity::<i32>()).prop_flat_map(|len| {
                let domain = tag_domain::<i32>(len);
                prop::collection::vec(domain, len)
            })
        }

        proptest! {
            #[test]
            fn sorts_i32_in_domain(data in in_domain_i32(), descending in any::<bool>()) {
                let options = if descending { SortOptions::descending() } else { SortOptions::default() };
                let mut actual = data.clone();
                sort_with(&mut actual, options);

                let mut expected = data;
                expected.sort_unstable();
                if descending {
                    expected.reverse();
                }
                prop_assert_eq!(actual, expected);
            }

            #[test]
            fn sorts_u64_full_range(
                data in prop::collection::vec(any::<u64>(), 1..=capacity::<u64>()),
                guard in any::<u64>(),
            ) {
                let len = data.len();
                let mut buffer = data.clone();
                buffer.push(guard);
                sort_with(&mut buffer[..len], SortOptions::default().tagging(Tagging::Disabled));

                let mut expected = data;
                expected.sort_unstable();
                prop_assert_eq!(&buffer[..len], &expected[..]);
                prop_assert_eq!(buffer[len], guard);
            }

            #[test]
            fn aligned_hint_never_changes_the_result(
                data in prop::collection::vec(-100i16..100, 1..=capacity::<i16>()),
                offset in 0usize..8,
            ) {
                let len = data.len();
                let mut plain = data.clone();
                sort(&mut plain);

                let mut shifted = vec![0i16; offset + len];
                shifted[offset..].copy_from_slice(&data);
                sort_with(&mut shifted[offset..], SortOptions::default().streaming(true));
                prop_assert_eq!(&shifted[offset..], &plain[..]);
            }
        }
    }
}
