//! Vector operation contract consumed by the sorting network.
//!
//! A backend is a zero-sized marker type implementing [`SimdOps`] for one
//! element type. Everything is resolved statically; the network never goes
//! through a vtable.

mod portable;
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86;

use std::fmt::Debug;
use std::ops::{BitAnd, BitOr, Shl, Shr};

pub use portable::Portable;

/// Scalar element type that fits in one vector lane.
///
/// `>>` must be arithmetic for signed types and logical for unsigned ones,
/// which is what the primitive integer impls do.
pub trait Lane:
    Copy
    + Ord
    + Debug
    + Default
    + Send
    + Sync
    + 'static
    + BitOr<Output = Self>
    + BitAnd<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    const BITS: u32;
    const MIN: Self;
    const MAX: Self;

    /// Truncating conversion of a lane or tag index.
    fn from_index(index: usize) -> Self;

    fn wrapping_add(self, other: Self) -> Self;
}

macro_rules! impl_lane {
    ($($t:ty),* $(,)?) => {
        $(
            impl Lane for $t {
                const BITS: u32 = <$t>::BITS;
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;

                #[inline(always)]
                fn from_index(index: usize) -> Self {
                    index as $t
                }

                #[inline(always)]
                fn wrapping_add(self, other: Self) -> Self {
                    <$t>::wrapping_add(self, other)
                }
            }
        )*
    };
}

impl_lane!(i16, u16, i32, u32, i64, u64);

/// Memory access policy for full-register loads and stores.
pub trait Access {
    const ALIGNED: bool;
    const STREAMING: bool;
}

/// Plain unaligned access.
pub enum Unaligned {}

/// Pointer is aligned to the register size.
pub enum Aligned {}

/// Non-temporal access; implies [`Aligned`].
pub enum Streaming {}

impl Access for Unaligned {
    const ALIGNED: bool = false;
    const STREAMING: bool = false;
}

impl Access for Aligned {
    const ALIGNED: bool = true;
    const STREAMING: bool = false;
}

impl Access for Streaming {
    const ALIGNED: bool = true;
    const STREAMING: bool = true;
}

/// Builds a [`SimdOps::shuffle`] pattern: output lane `i` of every 4-lane
/// group takes input lane `lanes[i]` of the same group.
pub const fn pattern(lanes: [u8; 4]) -> i32 {
    (lanes[0] as i32 & 3)
        | ((lanes[1] as i32 & 3) << 2)
        | ((lanes[2] as i32 & 3) << 4)
        | ((lanes[3] as i32 & 3) << 6)
}

/// Partner at distance 1: `[1, 0, 3, 2]`.
pub const SWAP_ADJACENT: i32 = pattern([1, 0, 3, 2]);
/// Partner at distance 2: `[2, 3, 0, 1]`.
pub const SWAP_PAIRS: i32 = pattern([2, 3, 0, 1]);
/// Reversal of a 4-lane group: `[3, 2, 1, 0]`.
pub const REVERSE: i32 = pattern([3, 2, 1, 0]);

/// Per element type vector primitives.
///
/// Every operation is lane-wise, branch-free and independent of the lane
/// values. Lanes are numbered in memory order.
pub trait SimdOps {
    type Lane: Lane;
    type Reg: Copy;

    /// Lanes per register. A power of two; the network handles 4 and 8.
    const PACKING: usize;
    const NAME: &'static str;

    /// Loads `PACKING` lanes.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `PACKING` lanes. With `A::ALIGNED` it
    /// must also be aligned to `PACKING * size_of::<Lane>()` bytes.
    unsafe fn load<A: Access>(ptr: *const Self::Lane) -> Self::Reg;

    /// Stores `PACKING` lanes.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `PACKING` lanes, aligned as for
    /// [`SimdOps::load`].
    unsafe fn store<A: Access>(ptr: *mut Self::Lane, reg: Self::Reg);

    /// Lanes `[0, len)` from memory, lanes `[len, PACKING)` set to `fill`.
    /// Never touches memory at or past `ptr + len`.
    ///
    /// # Safety
    ///
    /// `1 <= len <= PACKING` and `ptr` valid for reads of `len` lanes.
    unsafe fn partial_load(ptr: *const Self::Lane, len: usize, fill: Self::Lane) -> Self::Reg;

    /// Writes exactly lanes `[0, len)`; memory at `[len, PACKING)` is left
    /// untouched.
    ///
    /// # Safety
    ///
    /// `1 <= len <= PACKING` and `ptr` valid for writes of `len` lanes.
    unsafe fn partial_store(ptr: *mut Self::Lane, len: usize, reg: Self::Reg);

    /// Orders preceding streaming stores.
    #[inline(always)]
    fn fence() {}

    fn min(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn max(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Permutes every 4-lane group by `PATTERN`, see [`pattern`].
    fn shuffle<const PATTERN: i32>(reg: Self::Reg) -> Self::Reg;

    /// Exchanges the lower and upper `PACKING / 2` lanes.
    fn swap_low_high(reg: Self::Reg) -> Self::Reg;

    /// Full lane reversal.
    fn mirror(reg: Self::Reg) -> Self::Reg;

    /// Lane `i` comes from `b` when bit `i` of `MASK` is set, else from `a`.
    fn blend<const MASK: i32>(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    fn broadcast(value: Self::Lane) -> Self::Reg;

    fn shift_left(reg: Self::Reg, bits: u32) -> Self::Reg;

    /// Arithmetic for signed lanes, logical for unsigned lanes.
    fn shift_right(reg: Self::Reg, bits: u32) -> Self::Reg;

    fn bitwise_or(a: Self::Reg, b: Self::Reg) -> Self::Reg;
    fn bitwise_and(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// Wrapping lane-wise addition.
    fn add(a: Self::Reg, b: Self::Reg) -> Self::Reg;

    /// `[0, 1, ..., PACKING - 1]`.
    fn index_sequence() -> Self::Reg;
}

/// Widest packing the in-register network is written for.
pub(crate) const MAX_PACKING: usize = 8;

/// Size of one register in bytes.
#[inline(always)]
pub const fn register_bytes<O: SimdOps>() -> usize {
    O::PACKING * size_of::<O::Lane>()
}

#[cfg(test)]
pub(crate) mod contract {
    use rand::distr::{Distribution, StandardUniform};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    const BUF_LANES: usize = 64;

    #[repr(C, align(64))]
    struct AlignedBuf<T>([T; BUF_LANES]);

    pub(crate) fn lanes<O: SimdOps>(reg: O::Reg) -> Vec<O::Lane> {
        let mut out = vec![O::Lane::default(); O::PACKING];
        unsafe { O::store::<Unaligned>(out.as_mut_ptr(), reg) };
        out
    }

    pub(crate) fn reg<O: SimdOps>(values: &[O::Lane]) -> O::Reg {
        assert_eq!(values.len(), O::PACKING);
        unsafe { O::load::<Unaligned>(values.as_ptr()) }
    }

    fn random_lanes<O: SimdOps, R: Rng>(rng: &mut R) -> Vec<O::Lane>
    where
        StandardUniform: Distribution<O::Lane>,
    {
        (0..O::PACKING).map(|_| rng.random()).collect()
    }

    /// Checks every operation of `O` against its scalar definition.
    pub(crate) fn check<O: SimdOps>(seed: u64)
    where
        StandardUniform: Distribution<O::Lane>,
    {
        let p = O::PACKING;
        assert!(p.is_power_of_two() && p <= 8, "{}: packing {p}", O::NAME);
        assert_eq!(BUF_LANES * size_of::<O::Lane>() % register_bytes::<O>(), 0);

        let mut rng = StdRng::seed_from_u64(seed);
        check_load_store::<O, _>(&mut rng);
        check_partial::<O, _>(&mut rng);

        for _ in 0..64 {
            let a = random_lanes::<O, _>(&mut rng);
            let b = random_lanes::<O, _>(&mut rng);
            let (ra, rb) = (reg::<O>(&a), reg::<O>(&b));

            let mi = lanes::<O>(O::min(ra, rb));
            let ma = lanes::<O>(O::max(ra, rb));
            let or = lanes::<O>(O::bitwise_or(ra, rb));
            let and = lanes::<O>(O::bitwise_and(ra, rb));
            let sum = lanes::<O>(O::add(ra, rb));
            for i in 0..p {
                assert_eq!(mi[i], a[i].min(b[i]), "{} min lane {i}", O::NAME);
                assert_eq!(ma[i], a[i].max(b[i]), "{} max lane {i}", O::NAME);
                assert_eq!(or[i], a[i] | b[i], "{} or lane {i}", O::NAME);
                assert_eq!(and[i], a[i] & b[i], "{} and lane {i}", O::NAME);
                assert_eq!(sum[i], a[i].wrapping_add(b[i]), "{} add lane {i}", O::NAME);
            }

            let swapped = lanes::<O>(O::swap_low_high(ra));
            let mirrored = lanes::<O>(O::mirror(ra));
            for i in 0..p {
                assert_eq!(swapped[i], a[(i + p / 2) % p], "{} swap_low_high", O::NAME);
                assert_eq!(mirrored[i], a[p - 1 - i], "{} mirror", O::NAME);
            }

            check_shuffle::<O>(&a, lanes::<O>(O::shuffle::<SWAP_ADJACENT>(ra)), [1, 0, 3, 2]);
            check_shuffle::<O>(&a, lanes::<O>(O::shuffle::<SWAP_PAIRS>(ra)), [2, 3, 0, 1]);
            check_shuffle::<O>(&a, lanes::<O>(O::shuffle::<REVERSE>(ra)), [3, 2, 1, 0]);
            check_shuffle::<O>(
                &a,
                lanes::<O>(O::shuffle::<{ pattern([0, 0, 3, 1]) }>(ra)),
                [0, 0, 3, 1],
            );

            // Complementary over the low 4 and the low 8 lanes alike.
            let blended = lanes::<O>(O::blend::<0b0110_0110>(ra, rb));
            let inverse = lanes::<O>(O::blend::<0b1001_1001>(ra, rb));
            for i in 0..p {
                let from_b = (0b0110_0110 >> i) & 1 == 1;
                assert_eq!(blended[i], if from_b { b[i] } else { a[i] }, "{} blend", O::NAME);
                assert_eq!(inverse[i], if from_b { a[i] } else { b[i] }, "{} blend", O::NAME);
            }

            for bits in 0..8 {
                let left = lanes::<O>(O::shift_left(ra, bits));
                let right = lanes::<O>(O::shift_right(ra, bits));
                for i in 0..p {
                    assert_eq!(left[i], a[i] << bits, "{} shl {bits}", O::NAME);
                    assert_eq!(right[i], a[i] >> bits, "{} shr {bits}", O::NAME);
                }
            }

            let splat = lanes::<O>(O::broadcast(a[0]));
            assert!(splat.iter().all(|&x| x == a[0]), "{} broadcast", O::NAME);
        }

        let seq = lanes::<O>(O::index_sequence());
        for (i, &x) in seq.iter().enumerate() {
            assert_eq!(x, O::Lane::from_index(i), "{} index_sequence", O::NAME);
        }
    }

    fn check_shuffle<O: SimdOps>(src: &[O::Lane], actual: Vec<O::Lane>, sel: [usize; 4]) {
        for (i, &x) in actual.iter().enumerate() {
            let group = i & !3;
            assert_eq!(x, src[group + sel[i & 3]], "{} shuffle {sel:?} lane {i}", O::NAME);
        }
    }

    fn check_load_store<O: SimdOps, R: Rng>(rng: &mut R)
    where
        StandardUniform: Distribution<O::Lane>,
    {
        let p = O::PACKING;
        let mut src = AlignedBuf([O::Lane::default(); BUF_LANES]);
        for x in src.0.iter_mut() {
            *x = rng.random();
        }

        for offset in 0..=(BUF_LANES - p) {
            let mut dst = AlignedBuf([O::Lane::default(); BUF_LANES]);
            unsafe {
                let r = O::load::<Unaligned>(src.0.as_ptr().add(offset));
                O::store::<Unaligned>(dst.0.as_mut_ptr().add(offset), r);
            }
            assert_eq!(src.0[offset..offset + p], dst.0[offset..offset + p], "{}", O::NAME);
        }

        for offset in (0..=(BUF_LANES - p)).step_by(p) {
            let mut aligned = AlignedBuf([O::Lane::default(); BUF_LANES]);
            let mut streamed = AlignedBuf([O::Lane::default(); BUF_LANES]);
            unsafe {
                let r = O::load::<Aligned>(src.0.as_ptr().add(offset));
                O::store::<Aligned>(aligned.0.as_mut_ptr().add(offset), r);
                let s = O::load::<Streaming>(src.0.as_ptr().add(offset));
                O::store::<Streaming>(streamed.0.as_mut_ptr().add(offset), s);
            }
            O::fence();
            assert_eq!(src.0[offset..offset + p], aligned.0[offset..offset + p]);
            assert_eq!(src.0[offset..offset + p], streamed.0[offset..offset + p]);
        }
    }

    fn check_partial<O: SimdOps, R: Rng>(rng: &mut R)
    where
        StandardUniform: Distribution<O::Lane>,
    {
        let p = O::PACKING;
        for len in 1..=p {
            // Exactly `len` lanes allocated so an over-read is out of bounds.
            let src: Vec<O::Lane> = (0..len).map(|_| rng.random()).collect();
            let fill = rng.random();
            let r = unsafe { O::partial_load(src.as_ptr(), len, fill) };
            let got = lanes::<O>(r);
            assert_eq!(got[..len], src[..], "{} partial_load {len}", O::NAME);
            assert!(got[len..].iter().all(|&x| x == fill), "{} partial fill", O::NAME);

            let poison: Vec<O::Lane> = (0..p).map(|_| rng.random()).collect();
            let mut dst = poison.clone();
            let full = random_lanes::<O, _>(rng);
            unsafe { O::partial_store(dst.as_mut_ptr(), len, reg::<O>(&full)) };
            assert_eq!(dst[..len], full[..len], "{} partial_store {len}", O::NAME);
            assert_eq!(dst[len..], poison[len..], "{} partial_store poison", O::NAME);
        }
    }
}
