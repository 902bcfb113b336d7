//! Per-call configuration.

use crate::ops::{SimdOps, register_bytes};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

/// How padding lanes are kept behind real lanes of equal value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tagging {
    /// Pack each lane's position into its low bits while sorting a partial
    /// tail. Values must lie in [`crate::tag_domain`].
    #[default]
    InLane,
    /// Plain sentinel padding. Correct for every value; padding that ties with
    /// a real lane is indistinguishable from it.
    Disabled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SortOptions {
    pub order: Order,
    /// Hint that the slice starts on a register boundary.
    pub aligned: bool,
    /// Use non-temporal loads and stores. Implies `aligned`.
    pub streaming: bool,
    pub tagging: Tagging,
}

impl SortOptions {
    pub fn ascending() -> Self {
        Self::default()
    }

    pub fn descending() -> Self {
        Self {
            order: Order::Descending,
            ..Self::default()
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn aligned(mut self, aligned: bool) -> Self {
        self.aligned = aligned;
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn tagging(mut self, tagging: Tagging) -> Self {
        self.tagging = tagging;
        self
    }
}

/// Access path actually taken for a given pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AccessPath {
    Unaligned,
    Aligned,
    Streaming,
}

impl AccessPath {
    /// Downgrades alignment hints that `ptr` does not satisfy.
    pub(crate) fn resolve<O: SimdOps>(options: &SortOptions, ptr: *const O::Lane) -> Self {
        if !(options.aligned || options.streaming) {
            return AccessPath::Unaligned;
        }
        if (ptr as usize) % register_bytes::<O>() != 0 {
            return AccessPath::Unaligned;
        }
        if options.streaming {
            AccessPath::Streaming
        } else {
            AccessPath::Aligned
        }
    }
}
