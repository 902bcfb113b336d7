//! In-lane index tagging.
//!
//! Every lane is replaced by `value << b | index`, where `index` is the
//! lane's position before sorting and `b = tag_bits(K * P)`. Equal values then
//! order by position, so sentinel padding (which sits after every real lane)
//! stays behind real lanes holding the same value. Descending sorts use the
//! reversed index `2^b - 1 - position` for the same effect.
//!
//! Lossless only for values in [`tag_domain`]; nothing here checks that.

use std::ops::RangeInclusive;

use crate::network::Direction;
use crate::ops::{Lane, MAX_PACKING, SimdOps, Unaligned};

/// Index bits needed to give `lanes` positions distinct tags.
#[inline]
pub const fn tag_bits(lanes: usize) -> u32 {
    if lanes <= 1 {
        0
    } else {
        usize::BITS - (lanes - 1).leading_zeros()
    }
}

/// Values that keep their order and bits after shifting by `bits`.
#[inline]
pub fn tag_domain<T: Lane>(bits: u32) -> RangeInclusive<T> {
    (T::MIN >> bits)..=(T::MAX >> bits)
}

/// Padding value: the extreme of `tag_domain(bits)` in sort direction.
#[inline(always)]
pub(crate) fn sentinel<T: Lane, D: Direction>(bits: u32) -> T {
    if D::ASCENDING { T::MAX >> bits } else { T::MIN >> bits }
}

#[inline(always)]
pub(crate) fn tag<O: SimdOps, D: Direction>(regs: &mut [O::Reg], bits: u32) {
    let p = O::PACKING;
    if D::ASCENDING {
        let seq = O::index_sequence();
        for (r, reg) in regs.iter_mut().enumerate() {
            let index = O::add(seq, O::broadcast(O::Lane::from_index(r * p)));
            *reg = O::bitwise_or(O::shift_left(*reg, bits), index);
        }
    } else {
        let top = 1usize << bits;
        let seq = O::mirror(O::index_sequence());
        for (r, reg) in regs.iter_mut().enumerate() {
            let base = top - (r + 1) * p;
            let index = O::add(seq, O::broadcast(O::Lane::from_index(base)));
            *reg = O::bitwise_or(O::shift_left(*reg, bits), index);
        }
    }
}

#[inline(always)]
pub(crate) fn untag<O: SimdOps>(regs: &mut [O::Reg], bits: u32) {
    for reg in regs.iter_mut() {
        *reg = O::shift_right(*reg, bits);
    }
}

/// Index of the first lane outside `tag_domain(bits)`.
pub(crate) fn first_outside_domain<T: Lane>(lanes: &[T], bits: u32) -> Option<usize> {
    let domain = tag_domain::<T>(bits);
    lanes.iter().position(|x| !domain.contains(x))
}

pub(crate) fn registers_in_domain<O: SimdOps>(regs: &[O::Reg], bits: u32) -> bool {
    let mut buf = [O::Lane::default(); MAX_PACKING];
    regs.iter().all(|&reg| {
        unsafe { O::store::<Unaligned>(buf.as_mut_ptr(), reg) };
        first_outside_domain(&buf[..O::PACKING], bits).is_none()
    })
}

/// True when, after sorting tagged registers, every position below `len`
/// holds a real lane and every position at or past `len` holds padding.
pub(crate) fn padding_sorted_last<O: SimdOps, D: Direction>(
    regs: &[O::Reg],
    len: usize,
    bits: u32,
) -> bool {
    let p = O::PACKING;
    let mask = O::broadcast(O::Lane::from_index((1usize << bits) - 1));
    let first_padding = if D::ASCENDING {
        O::Lane::from_index(len)
    } else {
        O::Lane::from_index((1usize << bits) - 1 - len)
    };

    let mut buf = [O::Lane::default(); MAX_PACKING];
    regs.iter().enumerate().all(|(r, &reg)| {
        unsafe { O::store::<Unaligned>(buf.as_mut_ptr(), O::bitwise_and(reg, mask)) };
        buf[..p].iter().enumerate().all(|(j, &index)| {
            let real = if D::ASCENDING {
                index < first_padding
            } else {
                index > first_padding
            };
            (r * p + j < len) == real
        })
    })
}
