use std::marker::PhantomData;
use std::ptr;

use super::{Access, Lane, SimdOps};

/// Scalar emulation of a `P`-lane register.
///
/// Used where no native backend exists for the element type or the CPU, and
/// as the reference the native backends are tested against.
pub struct Portable<T, const P: usize>(PhantomData<T>);

impl<T: Lane, const P: usize> Portable<T, P> {
    #[inline(always)]
    fn map2(a: [T; P], b: [T; P], f: impl Fn(T, T) -> T) -> [T; P] {
        let mut out = a;
        for i in 0..P {
            out[i] = f(a[i], b[i]);
        }
        out
    }

    #[inline(always)]
    fn permute(reg: [T; P], source: impl Fn(usize) -> usize) -> [T; P] {
        let mut out = reg;
        for (i, x) in out.iter_mut().enumerate() {
            *x = reg[source(i)];
        }
        out
    }
}

impl<T: Lane, const P: usize> SimdOps for Portable<T, P> {
    type Lane = T;
    type Reg = [T; P];

    const PACKING: usize = P;
    const NAME: &'static str = "portable";

    #[inline(always)]
    unsafe fn load<A: Access>(ptr: *const T) -> [T; P] {
        unsafe { ptr.cast::<[T; P]>().read_unaligned() }
    }

    #[inline(always)]
    unsafe fn store<A: Access>(ptr: *mut T, reg: [T; P]) {
        unsafe { ptr.cast::<[T; P]>().write_unaligned(reg) }
    }

    #[inline(always)]
    unsafe fn partial_load(ptr: *const T, len: usize, fill: T) -> [T; P] {
        debug_assert!((1..=P).contains(&len));
        let mut out = [fill; P];
        unsafe { ptr::copy_nonoverlapping(ptr, out.as_mut_ptr(), len) };
        out
    }

    #[inline(always)]
    unsafe fn partial_store(ptr: *mut T, len: usize, reg: [T; P]) {
        debug_assert!((1..=P).contains(&len));
        unsafe { ptr::copy_nonoverlapping(reg.as_ptr(), ptr, len) };
    }

    #[inline(always)]
    fn min(a: [T; P], b: [T; P]) -> [T; P] {
        Self::map2(a, b, Ord::min)
    }

    #[inline(always)]
    fn max(a: [T; P], b: [T; P]) -> [T; P] {
        Self::map2(a, b, Ord::max)
    }

    #[inline(always)]
    fn shuffle<const PATTERN: i32>(reg: [T; P]) -> [T; P] {
        Self::permute(reg, |i| (i & !3) | ((PATTERN >> (2 * (i & 3))) & 3) as usize)
    }

    #[inline(always)]
    fn swap_low_high(reg: [T; P]) -> [T; P] {
        Self::permute(reg, |i| i ^ (P / 2))
    }

    #[inline(always)]
    fn mirror(reg: [T; P]) -> [T; P] {
        Self::permute(reg, |i| P - 1 - i)
    }

    #[inline(always)]
    fn blend<const MASK: i32>(a: [T; P], b: [T; P]) -> [T; P] {
        let mut out = a;
        for i in 0..P {
            if (MASK >> i) & 1 == 1 {
                out[i] = b[i];
            }
        }
        out
    }

    #[inline(always)]
    fn broadcast(value: T) -> [T; P] {
        [value; P]
    }

    #[inline(always)]
    fn shift_left(reg: [T; P], bits: u32) -> [T; P] {
        reg.map(|x| x << bits)
    }

    #[inline(always)]
    fn shift_right(reg: [T; P], bits: u32) -> [T; P] {
        reg.map(|x| x >> bits)
    }

    #[inline(always)]
    fn bitwise_or(a: [T; P], b: [T; P]) -> [T; P] {
        Self::map2(a, b, |x, y| x | y)
    }

    #[inline(always)]
    fn bitwise_and(a: [T; P], b: [T; P]) -> [T; P] {
        Self::map2(a, b, |x, y| x & y)
    }

    #[inline(always)]
    fn add(a: [T; P], b: [T; P]) -> [T; P] {
        Self::map2(a, b, T::wrapping_add)
    }

    #[inline(always)]
    fn index_sequence() -> [T; P] {
        std::array::from_fn(T::from_index)
    }
}
