use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Pseudo-random source shared by every job of a run.
///
/// Jobs draw from it concurrently, so the generator sits behind a mutex and
/// is handed around as `Arc<SharedRng>`. Seed it for reproducible tests.
#[derive(Debug)]
pub struct SharedRng<R = StdRng> {
    inner: Mutex<R>,
}

impl SharedRng<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SharedRng<R> {
    pub fn new(rng: R) -> Self {
        Self {
            inner: Mutex::new(rng),
        }
    }

    /// Uniform integer in `[min, max]`. Requires `min <= max`.
    pub fn random_int(&self, min: u32, max: u32) -> u32 {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .random_range(min..=max)
    }

    /// Uniform float in `[min, max)`. Requires `min <= max`.
    pub fn random_float(&self, min: f64, max: f64) -> f64 {
        if min == max {
            return min;
        }
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .random_range(min..max)
    }
}
