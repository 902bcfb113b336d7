//! Load, tag, sort, untag, store.
//!
//! Everything here is generic over the backend so that, once monomorphized
//! inside a `#[target_feature]` entry point, the whole call runs with that
//! feature set.

use crate::MAX_REGISTERS;
use crate::network::{self, Ascending, Descending, Direction};
use crate::ops::{Access, Aligned, SimdOps, Streaming, Unaligned};
use crate::options::{AccessPath, Order, SortOptions, Tagging};
use crate::partial;
use crate::tagging::{self, tag_bits};

/// Largest input one call accepts for backend `O`.
#[inline(always)]
pub(crate) const fn capacity_of<O: SimdOps>() -> usize {
    O::PACKING * MAX_REGISTERS
}

/// Index bits a call on `len` elements spends on tags. Zero when the input
/// fills whole registers: without padding there is nothing to keep apart.
#[inline(always)]
pub(crate) const fn tail_tag_bits(len: usize, packing: usize, tagging: Tagging) -> u32 {
    match tagging {
        Tagging::InLane if len % packing != 0 => tag_bits(len.div_ceil(packing) * packing),
        _ => 0,
    }
}

#[inline(always)]
fn assert_capacity<O: SimdOps>(len: usize) {
    let capacity = capacity_of::<O>();
    assert!(
        len <= capacity,
        "{} elements exceed the capacity of {} ({})",
        len,
        capacity,
        O::NAME
    );
}

#[inline(always)]
pub(crate) fn sort_slice<O: SimdOps>(data: &mut [O::Lane], options: &SortOptions) {
    let len = data.len();
    if len == 0 {
        return;
    }
    assert_capacity::<O>(len);

    let bits = tail_tag_bits(len, O::PACKING, options.tagging);
    debug_assert!(
        bits == 0 || tagging::first_outside_domain(data, bits).is_none(),
        "input outside the {bits}-bit tag domain; use Tagging::Disabled"
    );

    let ptr = data.as_mut_ptr();
    // SAFETY: `ptr` covers `len <= capacity` lanes and the access path only
    // claims alignment that `resolve` has checked.
    unsafe {
        match (options.order, AccessPath::resolve::<O>(options, ptr)) {
            (Order::Ascending, AccessPath::Unaligned) => {
                load_sort_store::<O, Ascending, Unaligned>(ptr, len, bits)
            }
            (Order::Ascending, AccessPath::Aligned) => {
                load_sort_store::<O, Ascending, Aligned>(ptr, len, bits)
            }
            (Order::Ascending, AccessPath::Streaming) => {
                load_sort_store::<O, Ascending, Streaming>(ptr, len, bits)
            }
            (Order::Descending, AccessPath::Unaligned) => {
                load_sort_store::<O, Descending, Unaligned>(ptr, len, bits)
            }
            (Order::Descending, AccessPath::Aligned) => {
                load_sort_store::<O, Descending, Aligned>(ptr, len, bits)
            }
            (Order::Descending, AccessPath::Streaming) => {
                load_sort_store::<O, Descending, Streaming>(ptr, len, bits)
            }
        }
    }
}

#[inline(always)]
pub(crate) fn sort_by_index<O, G, S>(len: usize, get: G, set: S, options: &SortOptions)
where
    O: SimdOps,
    G: FnMut(usize) -> O::Lane,
    S: FnMut(usize, O::Lane),
{
    if len == 0 {
        return;
    }
    assert_capacity::<O>(len);

    let bits = tail_tag_bits(len, O::PACKING, options.tagging);
    match options.order {
        Order::Ascending => gather_sort_scatter::<O, Ascending, G, S>(len, get, set, bits),
        Order::Descending => gather_sort_scatter::<O, Descending, G, S>(len, get, set, bits),
    }
}

/// # Safety
///
/// `ptr` valid for reads and writes of `len` lanes, `0 < len <= capacity`,
/// aligned as `A` requires.
#[inline(always)]
unsafe fn load_sort_store<O: SimdOps, D: Direction, A: Access>(
    ptr: *mut O::Lane,
    len: usize,
    bits: u32,
) {
    let sentinel = tagging::sentinel::<O::Lane, D>(bits);
    let mut storage = [O::broadcast(sentinel); MAX_REGISTERS];
    let regs = &mut storage[..len.div_ceil(O::PACKING)];

    unsafe { partial::load_registers::<O, A>(ptr, len, sentinel, regs) };
    sort_registers::<O, D>(regs, len, bits);
    unsafe { partial::store_registers::<O, A>(ptr, len, regs) };

    if A::STREAMING {
        O::fence();
    }
}

#[inline(always)]
fn gather_sort_scatter<O, D, G, S>(len: usize, get: G, set: S, bits: u32)
where
    O: SimdOps,
    D: Direction,
    G: FnMut(usize) -> O::Lane,
    S: FnMut(usize, O::Lane),
{
    let sentinel = tagging::sentinel::<O::Lane, D>(bits);
    let mut storage = [O::broadcast(sentinel); MAX_REGISTERS];
    let regs = &mut storage[..len.div_ceil(O::PACKING)];

    partial::gather::<O, G>(get, len, sentinel, regs);
    debug_assert!(
        bits == 0 || tagging::registers_in_domain::<O>(regs, bits),
        "input outside the {bits}-bit tag domain; use Tagging::Disabled"
    );
    sort_registers::<O, D>(regs, len, bits);
    partial::scatter::<O, S>(set, len, regs);
}

#[inline(always)]
fn sort_registers<O: SimdOps, D: Direction>(regs: &mut [O::Reg], len: usize, bits: u32) {
    if bits == 0 {
        network::sort::<O, D>(regs);
        return;
    }

    tagging::tag::<O, D>(regs, bits);
    network::sort::<O, D>(regs);
    debug_assert!(tagging::padding_sorted_last::<O, D>(regs, len, bits));
    tagging::untag::<O>(regs, bits);
}
