//! Register-granular access to an input whose length is not a multiple of
//! the packing factor.
//!
//! `len` lanes map onto `ceil(len / P)` registers. Full registers go straight
//! through [`SimdOps::load`]/[`SimdOps::store`]; the tail register uses the
//! masked partial operations, so nothing at or past `len` is read or written.

use crate::ops::{Access, MAX_PACKING, SimdOps, Unaligned};

/// Tail register: lanes `[0, rem)` from `ptr`, `sentinel` in the rest.
///
/// # Safety
///
/// `0 < rem <= PACKING`, `ptr` valid for reads of `rem` lanes.
#[inline(always)]
pub(crate) unsafe fn load_tail<O: SimdOps>(
    ptr: *const O::Lane,
    rem: usize,
    sentinel: O::Lane,
) -> O::Reg {
    unsafe { O::partial_load(ptr, rem, sentinel) }
}

/// Persists lanes `[0, rem)` of `reg`; `ptr + rem ..` stays untouched.
///
/// # Safety
///
/// `0 < rem <= PACKING`, `ptr` valid for writes of `rem` lanes.
#[inline(always)]
pub(crate) unsafe fn store_tail<O: SimdOps>(ptr: *mut O::Lane, rem: usize, reg: O::Reg) {
    unsafe { O::partial_store(ptr, rem, reg) }
}

/// Fills `regs` from the `len` lanes at `ptr`.
///
/// # Safety
///
/// `regs.len() == len.div_ceil(PACKING)`, `ptr` valid for reads of `len`
/// lanes and aligned as `A` requires.
#[inline(always)]
pub(crate) unsafe fn load_registers<O: SimdOps, A: Access>(
    ptr: *const O::Lane,
    len: usize,
    sentinel: O::Lane,
    regs: &mut [O::Reg],
) {
    let p = O::PACKING;
    let full = len / p;
    debug_assert_eq!(regs.len(), len.div_ceil(p));

    for (i, reg) in regs[..full].iter_mut().enumerate() {
        *reg = unsafe { O::load::<A>(ptr.add(i * p)) };
    }
    if len % p != 0 {
        regs[full] = unsafe { load_tail::<O>(ptr.add(full * p), len % p, sentinel) };
    }
}

/// Writes the first `len` lanes of `regs` back to `ptr`.
///
/// # Safety
///
/// Same as [`load_registers`], for writes.
#[inline(always)]
pub(crate) unsafe fn store_registers<O: SimdOps, A: Access>(
    ptr: *mut O::Lane,
    len: usize,
    regs: &[O::Reg],
) {
    let p = O::PACKING;
    let full = len / p;
    debug_assert_eq!(regs.len(), len.div_ceil(p));

    for (i, &reg) in regs[..full].iter().enumerate() {
        unsafe { O::store::<A>(ptr.add(i * p), reg) };
    }
    if len % p != 0 {
        unsafe { store_tail::<O>(ptr.add(full * p), len % p, regs[full]) };
    }
}

/// Like [`load_registers`], reading lane `i` through `get(i)` exactly once
/// for every `i < len`, in increasing order.
pub(crate) fn gather<O: SimdOps, G: FnMut(usize) -> O::Lane>(
    mut get: G,
    len: usize,
    sentinel: O::Lane,
    regs: &mut [O::Reg],
) {
    let p = O::PACKING;
    debug_assert!(p <= MAX_PACKING);
    debug_assert_eq!(regs.len(), len.div_ceil(p));

    let mut buf = [sentinel; MAX_PACKING];
    for (r, reg) in regs.iter_mut().enumerate() {
        let base = r * p;
        let lanes = p.min(len - base);
        for (j, slot) in buf[..lanes].iter_mut().enumerate() {
            *slot = get(base + j);
        }
        *reg = unsafe {
            if lanes == p {
                O::load::<Unaligned>(buf.as_ptr())
            } else {
                load_tail::<O>(buf.as_ptr(), lanes, sentinel)
            }
        };
    }
}

/// Like [`store_registers`], writing lane `i` through `set(i, value)` exactly
/// once for every `i < len`, in increasing order.
pub(crate) fn scatter<O: SimdOps, S: FnMut(usize, O::Lane)>(
    mut set: S,
    len: usize,
    regs: &[O::Reg],
) {
    let p = O::PACKING;
    debug_assert!(p <= MAX_PACKING);
    debug_assert_eq!(regs.len(), len.div_ceil(p));

    let mut buf = [O::Lane::default(); MAX_PACKING];
    for (r, &reg) in regs.iter().enumerate() {
        let base = r * p;
        let lanes = p.min(len - base);
        unsafe { O::store::<Unaligned>(buf.as_mut_ptr(), reg) };
        for (j, &value) in buf[..lanes].iter().enumerate() {
            set(base + j, value);
        }
    }
}
