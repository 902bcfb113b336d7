//! Oblivious bitonic sorting network over `K` registers.
//!
//! The instruction sequence depends only on `K`, `P` and the direction, never
//! on lane values.
//!
//! * `sort(K)` sorts the first `K / 2` registers in the reverse direction and
//!   the remaining ones in the requested direction, which leaves a bitonic
//!   sequence, then merges.
//! * `merge(K)` expects a bitonic sequence. It compare-exchanges register `i`
//!   with `i + K0` for `i < K - K0`, where `K0` is the greatest power of two
//!   below `K`, then merges both runs independently. Splitting at a power of
//!   two is what keeps each run bitonic for non-power-of-two `K`.
//! * A single register is sorted with the in-register network below.

use crate::ops::{MAX_PACKING, SWAP_ADJACENT, SWAP_PAIRS, SimdOps};

/// Sort direction, resolved at compile time.
pub trait Direction {
    const ASCENDING: bool;
    type Reverse: Direction;
}

pub enum Ascending {}

pub enum Descending {}

impl Direction for Ascending {
    const ASCENDING: bool = true;
    type Reverse = Descending;
}

impl Direction for Descending {
    const ASCENDING: bool = false;
    type Reverse = Ascending;
}

/// Sorts the `regs.len() * PACKING` lanes of `regs` as one sequence.
#[inline]
pub fn sort<O: SimdOps, D: Direction>(regs: &mut [O::Reg]) {
    match regs.len() {
        0 => {}
        1 => sort_register::<O, D>(&mut regs[0]),
        k => {
            let (lo, hi) = regs.split_at_mut(k / 2);
            sort::<O, D::Reverse>(lo);
            sort::<O, D>(hi);
            merge::<O, D>(regs);
        }
    }
}

/// Sorts `regs` in direction `D`, given a run sorted against `D` followed by
/// a run sorted along `D` (for ascending: non-increasing, then
/// non-decreasing). Either run may be empty. This is the shape [`sort`]
/// leaves behind; the mirrored shape is not handled when the register count
/// is not a power of two.
#[inline]
pub fn merge<O: SimdOps, D: Direction>(regs: &mut [O::Reg]) {
    match regs.len() {
        0 => {}
        1 => merge_register::<O, D>(&mut regs[0]),
        k => {
            let (lo, hi) = regs.split_at_mut(greatest_power_of_two_below(k));
            for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
                compare_exchange::<O, D>(a, b);
            }
            merge::<O, D>(lo);
            merge::<O, D>(hi);
        }
    }
}

#[inline(always)]
fn greatest_power_of_two_below(k: usize) -> usize {
    debug_assert!(k >= 2);
    1 << (usize::BITS - 1 - (k - 1).leading_zeros())
}

#[inline(always)]
fn compare_exchange<O: SimdOps, D: Direction>(a: &mut O::Reg, b: &mut O::Reg) {
    let (x, y) = (*a, *b);
    if D::ASCENDING {
        *a = O::min(x, y);
        *b = O::max(x, y);
    } else {
        *a = O::max(x, y);
        *b = O::min(x, y);
    }
}

/// One in-register stage: every lane meets `partner`'s lane, lanes selected
/// by `MASK` keep the maximum, the others the minimum.
#[inline(always)]
fn stage<O: SimdOps, const MASK: i32>(v: O::Reg, partner: O::Reg) -> O::Reg {
    O::blend::<MASK>(O::min(v, partner), O::max(v, partner))
}

/// Like [`stage`], with the mask complemented for descending order.
#[inline(always)]
fn directed_stage<O: SimdOps, D: Direction, const ASC: i32, const DESC: i32>(
    v: O::Reg,
    partner: O::Reg,
) -> O::Reg {
    if D::ASCENDING {
        stage::<O, ASC>(v, partner)
    } else {
        stage::<O, DESC>(v, partner)
    }
}

#[inline(always)]
fn sort_register<O: SimdOps, D: Direction>(reg: &mut O::Reg) {
    const {
        assert!(O::PACKING == 4 || O::PACKING == 8);
        assert!(O::PACKING <= MAX_PACKING);
    }

    let v = *reg;
    // Runs of PACKING / 2 lanes, alternating ascending and descending.
    *reg = if O::PACKING == 8 {
        let v = stage::<O, 0x66>(v, O::shuffle::<SWAP_ADJACENT>(v));
        let v = stage::<O, 0x3C>(v, O::shuffle::<SWAP_PAIRS>(v));
        stage::<O, 0x5A>(v, O::shuffle::<SWAP_ADJACENT>(v))
    } else {
        stage::<O, 0x6>(v, O::shuffle::<SWAP_ADJACENT>(v))
    };
    merge_register::<O, D>(reg);
}

#[inline(always)]
fn merge_register<O: SimdOps, D: Direction>(reg: &mut O::Reg) {
    let v = *reg;
    *reg = if O::PACKING == 8 {
        let v = directed_stage::<O, D, 0xF0, 0x0F>(v, O::swap_low_high(v));
        let v = directed_stage::<O, D, 0xCC, 0x33>(v, O::shuffle::<SWAP_PAIRS>(v));
        directed_stage::<O, D, 0xAA, 0x55>(v, O::shuffle::<SWAP_ADJACENT>(v))
    } else {
        let v = directed_stage::<O, D, 0xC, 0x3>(v, O::swap_low_high(v));
        directed_stage::<O, D, 0xA, 0x5>(v, O::shuffle::<SWAP_ADJACENT>(v))
    };
}
