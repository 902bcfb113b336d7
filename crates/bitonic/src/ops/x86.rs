//! Native x86_64 backends: AVX2 for 32 and 64-bit lanes, SSE4.1 for 16-bit
//! lanes.
//!
//! These types are only instantiated from `#[target_feature]` entry points
//! reached after runtime feature detection (see `dispatch`).

use std::arch::x86_64::*;
use std::ptr;

use super::{Access, REVERSE, SWAP_PAIRS, SimdOps};

#[inline(always)]
unsafe fn load256<A: Access>(ptr: *const __m256i) -> __m256i {
    unsafe {
        if A::STREAMING {
            _mm256_stream_load_si256(ptr)
        } else if A::ALIGNED {
            _mm256_load_si256(ptr)
        } else {
            _mm256_loadu_si256(ptr)
        }
    }
}

#[inline(always)]
unsafe fn store256<A: Access>(ptr: *mut __m256i, reg: __m256i) {
    unsafe {
        if A::STREAMING {
            _mm256_stream_si256(ptr, reg)
        } else if A::ALIGNED {
            _mm256_store_si256(ptr, reg)
        } else {
            _mm256_storeu_si256(ptr, reg)
        }
    }
}

#[inline(always)]
unsafe fn load128<A: Access>(ptr: *const __m128i) -> __m128i {
    unsafe {
        if A::STREAMING {
            _mm_stream_load_si128(ptr)
        } else if A::ALIGNED {
            _mm_load_si128(ptr)
        } else {
            _mm_loadu_si128(ptr)
        }
    }
}

#[inline(always)]
unsafe fn store128<A: Access>(ptr: *mut __m128i, reg: __m128i) {
    unsafe {
        if A::STREAMING {
            _mm_stream_si128(ptr, reg)
        } else if A::ALIGNED {
            _mm_store_si128(ptr, reg)
        } else {
            _mm_storeu_si128(ptr, reg)
        }
    }
}

/// All-ones in lanes `[0, len)`.
#[inline(always)]
fn lane_mask32(len: usize) -> __m256i {
    unsafe {
        _mm256_cmpgt_epi32(
            _mm256_set1_epi32(len as i32),
            _mm256_setr_epi32(0, 1, 2, 3, 4, 5, 6, 7),
        )
    }
}

#[inline(always)]
fn lane_mask64(len: usize) -> __m256i {
    unsafe { _mm256_cmpgt_epi64(_mm256_set1_epi64x(len as i64), _mm256_setr_epi64x(0, 1, 2, 3)) }
}

#[inline(always)]
fn shift_count(bits: u32) -> __m128i {
    unsafe { _mm_cvtsi32_si128(bits as i32) }
}

#[inline(always)]
fn gt_i64(a: __m256i, b: __m256i) -> __m256i {
    unsafe { _mm256_cmpgt_epi64(a, b) }
}

#[inline(always)]
fn gt_u64(a: __m256i, b: __m256i) -> __m256i {
    unsafe {
        let bias = _mm256_set1_epi64x(i64::MIN);
        _mm256_cmpgt_epi64(_mm256_xor_si256(a, bias), _mm256_xor_si256(b, bias))
    }
}

// AVX2 has no 64-bit arithmetic shift; refill the vacated bits from the sign.
#[inline(always)]
fn sra_i64(reg: __m256i, bits: u32) -> __m256i {
    unsafe {
        let logical = _mm256_srl_epi64(reg, shift_count(bits));
        let sign = _mm256_cmpgt_epi64(_mm256_setzero_si256(), reg);
        _mm256_or_si256(logical, _mm256_sll_epi64(sign, shift_count(64 - bits)))
    }
}

#[inline(always)]
fn srl_u64(reg: __m256i, bits: u32) -> __m256i {
    unsafe { _mm256_srl_epi64(reg, shift_count(bits)) }
}

macro_rules! avx2_32 {
    ($name:ident, $lane:ty, $label:literal, $min:ident, $max:ident, $shr:ident) => {
        pub(crate) enum $name {}

        impl SimdOps for $name {
            type Lane = $lane;
            type Reg = __m256i;

            const PACKING: usize = 8;
            const NAME: &'static str = $label;

            #[inline(always)]
            unsafe fn load<A: Access>(ptr: *const $lane) -> __m256i {
                unsafe { load256::<A>(ptr.cast()) }
            }

            #[inline(always)]
            unsafe fn store<A: Access>(ptr: *mut $lane, reg: __m256i) {
                unsafe { store256::<A>(ptr.cast(), reg) }
            }

            #[inline(always)]
            unsafe fn partial_load(ptr: *const $lane, len: usize, fill: $lane) -> __m256i {
                debug_assert!((1..=8).contains(&len));
                let mask = lane_mask32(len);
                unsafe {
                    let loaded = _mm256_maskload_epi32(ptr.cast::<i32>(), mask);
                    _mm256_blendv_epi8(_mm256_set1_epi32(fill as i32), loaded, mask)
                }
            }

            #[inline(always)]
            unsafe fn partial_store(ptr: *mut $lane, len: usize, reg: __m256i) {
                debug_assert!((1..=8).contains(&len));
                unsafe { _mm256_maskstore_epi32(ptr.cast::<i32>(), lane_mask32(len), reg) }
            }

            #[inline(always)]
            fn fence() {
                unsafe { _mm_sfence() }
            }

            #[inline(always)]
            fn min(a: __m256i, b: __m256i) -> __m256i {
                unsafe { $min(a, b) }
            }

            #[inline(always)]
            fn max(a: __m256i, b: __m256i) -> __m256i {
                unsafe { $max(a, b) }
            }

            #[inline(always)]
            fn shuffle<const PATTERN: i32>(reg: __m256i) -> __m256i {
                unsafe { _mm256_shuffle_epi32::<PATTERN>(reg) }
            }

            #[inline(always)]
            fn swap_low_high(reg: __m256i) -> __m256i {
                unsafe { _mm256_permute2x128_si256::<0x01>(reg, reg) }
            }

            #[inline(always)]
            fn mirror(reg: __m256i) -> __m256i {
                Self::shuffle::<REVERSE>(Self::swap_low_high(reg))
            }

            #[inline(always)]
            fn blend<const MASK: i32>(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_blend_epi32::<MASK>(a, b) }
            }

            #[inline(always)]
            fn broadcast(value: $lane) -> __m256i {
                unsafe { _mm256_set1_epi32(value as i32) }
            }

            #[inline(always)]
            fn shift_left(reg: __m256i, bits: u32) -> __m256i {
                unsafe { _mm256_sll_epi32(reg, shift_count(bits)) }
            }

            #[inline(always)]
            fn shift_right(reg: __m256i, bits: u32) -> __m256i {
                unsafe { $shr(reg, shift_count(bits)) }
            }

            #[inline(always)]
            fn bitwise_or(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_or_si256(a, b) }
            }

            #[inline(always)]
            fn bitwise_and(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_and_si256(a, b) }
            }

            #[inline(always)]
            fn add(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_add_epi32(a, b) }
            }

            #[inline(always)]
            fn index_sequence() -> __m256i {
                unsafe { _mm256_setr_epi32(0, 1, 2, 3, 4, 5, 6, 7) }
            }
        }
    };
}

macro_rules! avx2_64 {
    ($name:ident, $lane:ty, $label:literal, $gt:ident, $shr:ident) => {
        pub(crate) enum $name {}

        impl SimdOps for $name {
            type Lane = $lane;
            type Reg = __m256i;

            const PACKING: usize = 4;
            const NAME: &'static str = $label;

            #[inline(always)]
            unsafe fn load<A: Access>(ptr: *const $lane) -> __m256i {
                unsafe { load256::<A>(ptr.cast()) }
            }

            #[inline(always)]
            unsafe fn store<A: Access>(ptr: *mut $lane, reg: __m256i) {
                unsafe { store256::<A>(ptr.cast(), reg) }
            }

            #[inline(always)]
            unsafe fn partial_load(ptr: *const $lane, len: usize, fill: $lane) -> __m256i {
                debug_assert!((1..=4).contains(&len));
                let mask = lane_mask64(len);
                unsafe {
                    let loaded = _mm256_maskload_epi64(ptr.cast::<i64>(), mask);
                    _mm256_blendv_epi8(_mm256_set1_epi64x(fill as i64), loaded, mask)
                }
            }

            #[inline(always)]
            unsafe fn partial_store(ptr: *mut $lane, len: usize, reg: __m256i) {
                debug_assert!((1..=4).contains(&len));
                unsafe { _mm256_maskstore_epi64(ptr.cast::<i64>(), lane_mask64(len), reg) }
            }

            #[inline(always)]
            fn fence() {
                unsafe { _mm_sfence() }
            }

            #[inline(always)]
            fn min(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_blendv_epi8(a, b, $gt(a, b)) }
            }

            #[inline(always)]
            fn max(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_blendv_epi8(b, a, $gt(a, b)) }
            }

            #[inline(always)]
            fn shuffle<const PATTERN: i32>(reg: __m256i) -> __m256i {
                unsafe { _mm256_permute4x64_epi64::<PATTERN>(reg) }
            }

            #[inline(always)]
            fn swap_low_high(reg: __m256i) -> __m256i {
                unsafe { _mm256_permute2x128_si256::<0x01>(reg, reg) }
            }

            #[inline(always)]
            fn mirror(reg: __m256i) -> __m256i {
                Self::shuffle::<REVERSE>(reg)
            }

            // `_mm256_blend_pd` rejects immediates wider than 4 bits, and the
            // 8-lane branch of the network still instantiates those.
            #[inline(always)]
            fn blend<const MASK: i32>(a: __m256i, b: __m256i) -> __m256i {
                let bit = |i: i32| -(((MASK >> i) & 1) as i64);
                unsafe { _mm256_blendv_epi8(a, b, _mm256_setr_epi64x(bit(0), bit(1), bit(2), bit(3))) }
            }

            #[inline(always)]
            fn broadcast(value: $lane) -> __m256i {
                unsafe { _mm256_set1_epi64x(value as i64) }
            }

            #[inline(always)]
            fn shift_left(reg: __m256i, bits: u32) -> __m256i {
                unsafe { _mm256_sll_epi64(reg, shift_count(bits)) }
            }

            #[inline(always)]
            fn shift_right(reg: __m256i, bits: u32) -> __m256i {
                $shr(reg, bits)
            }

            #[inline(always)]
            fn bitwise_or(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_or_si256(a, b) }
            }

            #[inline(always)]
            fn bitwise_and(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_and_si256(a, b) }
            }

            #[inline(always)]
            fn add(a: __m256i, b: __m256i) -> __m256i {
                unsafe { _mm256_add_epi64(a, b) }
            }

            #[inline(always)]
            fn index_sequence() -> __m256i {
                unsafe { _mm256_setr_epi64x(0, 1, 2, 3) }
            }
        }
    };
}

macro_rules! sse41_16 {
    ($name:ident, $lane:ty, $label:literal, $min:ident, $max:ident, $shr:ident) => {
        pub(crate) enum $name {}

        impl SimdOps for $name {
            type Lane = $lane;
            type Reg = __m128i;

            const PACKING: usize = 8;
            const NAME: &'static str = $label;

            #[inline(always)]
            unsafe fn load<A: Access>(ptr: *const $lane) -> __m128i {
                unsafe { load128::<A>(ptr.cast()) }
            }

            #[inline(always)]
            unsafe fn store<A: Access>(ptr: *mut $lane, reg: __m128i) {
                unsafe { store128::<A>(ptr.cast(), reg) }
            }

            // No 16-bit masked load; stage through a filled stack copy so
            // only `[0, len)` of the source is read.
            #[inline(always)]
            unsafe fn partial_load(ptr: *const $lane, len: usize, fill: $lane) -> __m128i {
                debug_assert!((1..=8).contains(&len));
                let mut buf = [fill; 8];
                unsafe {
                    ptr::copy_nonoverlapping(ptr, buf.as_mut_ptr(), len);
                    _mm_loadu_si128(buf.as_ptr().cast())
                }
            }

            #[inline(always)]
            unsafe fn partial_store(ptr: *mut $lane, len: usize, reg: __m128i) {
                debug_assert!((1..=8).contains(&len));
                let mut buf = [0 as $lane; 8];
                unsafe {
                    _mm_storeu_si128(buf.as_mut_ptr().cast(), reg);
                    ptr::copy_nonoverlapping(buf.as_ptr(), ptr, len);
                }
            }

            #[inline(always)]
            fn fence() {
                unsafe { _mm_sfence() }
            }

            #[inline(always)]
            fn min(a: __m128i, b: __m128i) -> __m128i {
                unsafe { $min(a, b) }
            }

            #[inline(always)]
            fn max(a: __m128i, b: __m128i) -> __m128i {
                unsafe { $max(a, b) }
            }

            #[inline(always)]
            fn shuffle<const PATTERN: i32>(reg: __m128i) -> __m128i {
                unsafe { _mm_shufflehi_epi16::<PATTERN>(_mm_shufflelo_epi16::<PATTERN>(reg)) }
            }

            #[inline(always)]
            fn swap_low_high(reg: __m128i) -> __m128i {
                unsafe { _mm_shuffle_epi32::<SWAP_PAIRS>(reg) }
            }

            #[inline(always)]
            fn mirror(reg: __m128i) -> __m128i {
                Self::shuffle::<REVERSE>(Self::swap_low_high(reg))
            }

            #[inline(always)]
            fn blend<const MASK: i32>(a: __m128i, b: __m128i) -> __m128i {
                unsafe { _mm_blend_epi16::<MASK>(a, b) }
            }

            #[inline(always)]
            fn broadcast(value: $lane) -> __m128i {
                unsafe { _mm_set1_epi16(value as i16) }
            }

            #[inline(always)]
            fn shift_left(reg: __m128i, bits: u32) -> __m128i {
                unsafe { _mm_sll_epi16(reg, shift_count(bits)) }
            }

            #[inline(always)]
            fn shift_right(reg: __m128i, bits: u32) -> __m128i {
                unsafe { $shr(reg, shift_count(bits)) }
            }

            #[inline(always)]
            fn bitwise_or(a: __m128i, b: __m128i) -> __m128i {
                unsafe { _mm_or_si128(a, b) }
            }

            #[inline(always)]
            fn bitwise_and(a: __m128i, b: __m128i) -> __m128i {
                unsafe { _mm_and_si128(a, b) }
            }

            #[inline(always)]
            fn add(a: __m128i, b: __m128i) -> __m128i {
                unsafe { _mm_add_epi16(a, b) }
            }

            #[inline(always)]
            fn index_sequence() -> __m128i {
                unsafe { _mm_setr_epi16(0, 1, 2, 3, 4, 5, 6, 7) }
            }
        }
    };
}

avx2_32!(Avx2I32, i32, "avx2_i32", _mm256_min_epi32, _mm256_max_epi32, _mm256_sra_epi32);
avx2_32!(Avx2U32, u32, "avx2_u32", _mm256_min_epu32, _mm256_max_epu32, _mm256_srl_epi32);
avx2_64!(Avx2I64, i64, "avx2_i64", gt_i64, sra_i64);
avx2_64!(Avx2U64, u64, "avx2_u64", gt_u64, srl_u64);
sse41_16!(Sse41I16, i16, "sse41_i16", _mm_min_epi16, _mm_max_epi16, _mm_sra_epi16);
sse41_16!(Sse41U16, u16, "sse41_u16", _mm_min_epu16, _mm_max_epu16, _mm_srl_epi16);
