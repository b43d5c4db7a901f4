use rand::prelude::*;
use rand_distr::StandardNormal;

/// Source of zero-mean noise for the signal model
pub trait NoiseSource: Send {
    /// Draw one sample from N(0, std_dev²)
    fn sample(&mut self, std_dev: f64) -> f64;
}

/// Gaussian noise backed by a seedable RNG
pub struct GaussianNoise {
    rng: StdRng,
}

impl GaussianNoise {
    /// Create with OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create with a fixed seed (reproducible sequences)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }
}

impl Default for GaussianNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for GaussianNoise {
    fn sample(&mut self, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * std_dev
    }
}

/// Noise source that always returns zero
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn sample(&mut self, _std_dev: f64) -> f64 {
        0.0
    }
}
