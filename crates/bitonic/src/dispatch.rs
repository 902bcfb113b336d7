//! Element types with a backend chosen at run time.
//!
//! On x86_64 each call checks the CPU once through `is_x86_feature_detected!`
//! (which caches) and enters a `#[target_feature]` function instantiated for
//! the native backend. Everywhere else, and on CPUs without the feature, the
//! portable backend runs with the same packing, so results are identical.

use crate::driver;
use crate::ops::{Lane, Portable, SimdOps};
use crate::options::SortOptions;

/// Element types [`crate::sort`] accepts.
pub trait SimdSort: Lane {
    /// Lanes per register, identical across backends.
    const PACKING: usize;

    /// Name of the backend the next call will use.
    fn backend() -> &'static str;

    #[doc(hidden)]
    fn sort_slice(data: &mut [Self], options: &SortOptions);

    #[doc(hidden)]
    fn sort_by_index<G, S>(len: usize, get: G, set: S, options: &SortOptions)
    where
        G: FnMut(usize) -> Self,
        S: FnMut(usize, Self);
}

#[inline(always)]
fn trace<O: SimdOps>(len: usize) {
    #[cfg(feature = "logging")]
    tracing::trace!(
        backend = O::NAME,
        lane = std::any::type_name::<O::Lane>(),
        len,
        "bitonic sort"
    );
    #[cfg(not(feature = "logging"))]
    let _ = len;
}

macro_rules! simd_sort {
    ($lane:ty, $packing:literal, $native:ident, $feature:tt) => {
        impl SimdSort for $lane {
            const PACKING: usize = $packing;

            fn backend() -> &'static str {
                #[cfg(target_arch = "x86_64")]
                if std::arch::is_x86_feature_detected!($feature) {
                    return <crate::ops::x86::$native as SimdOps>::NAME;
                }
                <Portable<$lane, $packing> as SimdOps>::NAME
            }

            fn sort_slice(data: &mut [$lane], options: &SortOptions) {
                #[cfg(target_arch = "x86_64")]
                if std::arch::is_x86_feature_detected!($feature) {
                    type Native = crate::ops::x86::$native;

                    #[target_feature(enable = $feature)]
                    unsafe fn native(data: &mut [$lane], options: &SortOptions) {
                        driver::sort_slice::<Native>(data, options)
                    }

                    trace::<Native>(data.len());
                    // SAFETY: the feature was detected above.
                    return unsafe { native(data, options) };
                }

                trace::<Portable<$lane, $packing>>(data.len());
                driver::sort_slice::<Portable<$lane, $packing>>(data, options)
            }

            fn sort_by_index<G, S>(len: usize, get: G, set: S, options: &SortOptions)
            where
                G: FnMut(usize) -> $lane,
                S: FnMut(usize, $lane),
            {
                #[cfg(target_arch = "x86_64")]
                if std::arch::is_x86_feature_detected!($feature) {
                    type Native = crate::ops::x86::$native;

                    #[target_feature(enable = $feature)]
                    unsafe fn native<G, S>(len: usize, get: G, set: S, options: &SortOptions)
                    where
                        G: FnMut(usize) -> $lane,
                        S: FnMut(usize, $lane),
                    {
                        driver::sort_by_index::<Native, G, S>(len, get, set, options)
                    }

                    trace::<Native>(len);
                    // SAFETY: the feature was detected above.
                    return unsafe { native(len, get, set, options) };
                }

                trace::<Portable<$lane, $packing>>(len);
                driver::sort_by_index::<Portable<$lane, $packing>, G, S>(len, get, set, options)
            }
        }
    };
}

simd_sort!(i16, 8, Sse41I16, "sse4.1");
simd_sort!(u16, 8, Sse41U16, "sse4.1");
simd_sort!(i32, 8, Avx2I32, "avx2");
simd_sort!(u32, 8, Avx2U32, "avx2");
simd_sort!(i64, 4, Avx2I64, "avx2");
simd_sort!(u64, 4, Avx2U64, "avx2");
