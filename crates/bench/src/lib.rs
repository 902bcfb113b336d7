use std::ops::Shr;
use std::time::Duration;

use criterion::BenchmarkGroup;
use criterion::measurement::Measurement;
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SMALL_RUNTIME_SAMPLE_SIZE: usize = 15;
const SMALL_RUNTIME_WARM_UP_MS: u64 = 100;
const SMALL_RUNTIME_MEASURE_MS: u64 = 200;
const MEDIUM_RUNTIME_SAMPLE_SIZE: usize = 15;
const MEDIUM_RUNTIME_WARM_UP_MS: u64 = 300;
const MEDIUM_RUNTIME_MEASURE_MS: u64 = 600;
const RNG_SEED: u64 = 0x5EED_2026;

pub fn apply_small_runtime_config<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    group.sample_size(SMALL_RUNTIME_SAMPLE_SIZE);
    group.warm_up_time(Duration::from_millis(SMALL_RUNTIME_WARM_UP_MS));
    group.measurement_time(Duration::from_millis(SMALL_RUNTIME_MEASURE_MS));
}

pub fn apply_medium_runtime_config<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    group.sample_size(MEDIUM_RUNTIME_SAMPLE_SIZE);
    group.warm_up_time(Duration::from_millis(MEDIUM_RUNTIME_WARM_UP_MS));
    group.measurement_time(Duration::from_millis(MEDIUM_RUNTIME_MEASURE_MS));
}

pub fn default_rng() -> StdRng {
    StdRng::seed_from_u64(RNG_SEED)
}

/// Value distribution of a benchmark input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataTrack {
    /// Uniform over the whole type.
    FullRange,
    /// Uniform over the type shifted right by a number of bits, which keeps
    /// values clear of the top bits a sort may borrow.
    Shifted(u32),
}

impl DataTrack {
    pub fn label(self) -> &'static str {
        match self {
            Self::FullRange => "full_range",
            Self::Shifted(_) => "shifted",
        }
    }
}

pub fn random_values<T, R>(rng: &mut R, len: usize, track: DataTrack) -> Vec<T>
where
    T: Shr<u32, Output = T>,
    R: Rng + ?Sized,
    StandardUniform: Distribution<T>,
{
    let bits = match track {
        DataTrack::FullRange => 0,
        DataTrack::Shifted(bits) => bits,
    };
    (0..len).map(|_| rng.random::<T>() >> bits).collect()
}

/// Derives an independent seed per benchmark case.
#[inline]
pub fn seed_for(len: usize, salt: u64) -> u64 {
    mix_seed(RNG_SEED ^ ((len as u64) << 32) ^ salt)
}

#[inline]
fn mix_seed(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
