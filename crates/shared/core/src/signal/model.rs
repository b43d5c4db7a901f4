use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::noise::{GaussianNoise, NoiseSource};
use crate::readings::ReadingSet;

/// Steps per heating cycle (~5 minutes at the default 5 s interval)
pub const DEFAULT_CYCLE_PERIOD: u64 = 60;

/// Round to a fixed number of decimal places, exact halves to even
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Operating band of one generated quantity
///
/// `level = round(clamp(base + swing * cycle_factor + noise, min, max))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub base: f64,
    pub swing: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub decimals: u32,
}

impl Band {
    /// Grid voltage: 220 V nominal, independent of load
    pub const VOLTAGE: Band = Band {
        base: 220.0,
        swing: 0.0,
        std_dev: 2.0,
        min: 200.0,
        max: 240.0,
        decimals: 2,
    };

    /// Line current: 8 A idle up to 45 A at full heat
    pub const CURRENT: Band = Band {
        base: 8.0,
        swing: 37.0,
        std_dev: 1.5,
        min: 5.0,
        max: 50.0,
        decimals: 2,
    };

    /// Power factor improves slightly with load
    pub const POWER_FACTOR: Band = Band {
        base: 0.92,
        swing: 0.05,
        std_dev: 0.01,
        min: 0.75,
        max: 0.99,
        decimals: 3,
    };

    /// Compute the band level, clamping before rounding
    pub fn level(&self, cycle_factor: f64, noise: &mut dyn NoiseSource) -> f64 {
        let raw = self.base + self.swing * cycle_factor + noise.sample(self.std_dev);
        round_to(raw.clamp(self.min, self.max), self.decimals)
    }
}

/// Signal model configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Steps per heating cycle
    #[serde(default = "default_cycle_period")]
    pub cycle_period: u64,
    /// Base seed for reproducible noise (entropy when absent)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_cycle_period() -> u64 {
    DEFAULT_CYCLE_PERIOD
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            cycle_period: default_cycle_period(),
            seed: None,
        }
    }
}

/// Stateful per-twin signal generator
pub struct SignalModel {
    cycle_period: u64,
    step: u64,
    noise: Box<dyn NoiseSource>,
}

impl SignalModel {
    /// Create a model with Gaussian noise, seeded from the config when set
    pub fn new(config: &SignalConfig) -> Self {
        Self::with_noise(config, GaussianNoise::from_seed(config.seed))
    }

    /// Create a model with an explicit noise source
    pub fn with_noise(config: &SignalConfig, noise: impl NoiseSource + 'static) -> Self {
        Self {
            cycle_period: config.cycle_period.max(1),
            step: 0,
            noise: Box::new(noise),
        }
    }

    /// Number of readings generated so far
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn cycle_period(&self) -> u64 {
        self.cycle_period
    }

    /// Load indicator in [0, 1] for a given step
    pub fn cycle_factor(&self, step: u64) -> f64 {
        let phase = TAU * (step % self.cycle_period) as f64 / self.cycle_period as f64;
        0.5 + 0.5 * phase.sin()
    }

    /// Advance one step and produce the next reading set
    pub fn generate(&mut self) -> ReadingSet {
        self.step += 1;
        let cycle_factor = self.cycle_factor(self.step);
        let noise = self.noise.as_mut();

        // Draw order matters for seeded runs: voltage, current, power factor
        let voltage_v = Band::VOLTAGE.level(0.0, noise);
        let current_a = Band::CURRENT.level(cycle_factor, noise);
        let power_factor = Band::POWER_FACTOR.level(cycle_factor, noise);

        // P = V * I * PF, never randomized on its own
        let active_power_kw = round_to(voltage_v * current_a * power_factor / 1000.0, 3);

        ReadingSet {
            voltage_v,
            current_a,
            active_power_kw,
            power_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ZeroNoise;
    use approx::assert_abs_diff_eq;

    /// Pushes every sample far outside its band
    struct ExtremeNoise(f64);

    impl NoiseSource for ExtremeNoise {
        fn sample(&mut self, std_dev: f64) -> f64 {
            self.0 * std_dev
        }
    }

    fn silent_model() -> SignalModel {
        SignalModel::with_noise(&SignalConfig::default(), ZeroNoise)
    }

    #[test]
    fn test_readings_stay_in_bounds() {
        let mut model = SignalModel::new(&SignalConfig {
            seed: Some(42),
            ..Default::default()
        });

        for _ in 0..5_000 {
            let r = model.generate();
            assert!((200.0..=240.0).contains(&r.voltage_v), "voltage {}", r.voltage_v);
            assert!((5.0..=50.0).contains(&r.current_a), "current {}", r.current_a);
            assert!((0.75..=0.99).contains(&r.power_factor), "pf {}", r.power_factor);
        }
    }

    #[test]
    fn test_active_power_is_derived() {
        let mut model = SignalModel::new(&SignalConfig::default());

        for _ in 0..1_000 {
            let r = model.generate();
            let expected = round_to(r.voltage_v * r.current_a * r.power_factor / 1000.0, 3);
            assert_eq!(r.active_power_kw, expected);
        }
    }

    #[test]
    fn test_cycle_is_periodic_without_noise() {
        let mut model = silent_model();
        let first: Vec<ReadingSet> = (0..60).map(|_| model.generate()).collect();
        let second: Vec<ReadingSet> = (0..60).map(|_| model.generate()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_cycle_extremes_without_noise() {
        let mut model = silent_model();
        let readings: Vec<ReadingSet> = (0..60).map(|_| model.generate()).collect();

        // Step 15: peak load (phase π/2)
        let peak = readings[14];
        assert_abs_diff_eq!(peak.voltage_v, 220.0, epsilon = 1e-9);
        assert_abs_diff_eq!(peak.current_a, 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(peak.power_factor, 0.97, epsilon = 1e-9);
        assert_abs_diff_eq!(peak.active_power_kw, 9.603, epsilon = 1e-9);

        // Step 45: idle (phase 3π/2)
        let idle = readings[44];
        assert_abs_diff_eq!(idle.current_a, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(idle.power_factor, 0.92, epsilon = 1e-9);

        // Step 60: mid-cycle
        let mid = readings[59];
        assert_abs_diff_eq!(mid.current_a, 26.5, epsilon = 1e-9);
        assert_abs_diff_eq!(mid.power_factor, 0.945, epsilon = 1e-9);
    }

    #[test]
    fn test_step_advances_once_per_generate() {
        let mut model = silent_model();
        assert_eq!(model.step(), 0);
        model.generate();
        model.generate();
        assert_eq!(model.step(), 2);
    }

    #[test]
    fn test_clamped_at_upper_bounds() {
        let mut model = SignalModel::with_noise(&SignalConfig::default(), ExtremeNoise(100.0));
        let r = model.generate();

        assert_abs_diff_eq!(r.voltage_v, 240.0, epsilon = 0.01);
        assert_abs_diff_eq!(r.current_a, 50.0, epsilon = 0.01);
        assert_abs_diff_eq!(r.power_factor, 0.99, epsilon = 0.01);
        assert_eq!(r.active_power_kw, round_to(240.0 * 50.0 * 0.99 / 1000.0, 3));
    }

    #[test]
    fn test_clamped_at_lower_bounds() {
        let mut model = SignalModel::with_noise(&SignalConfig::default(), ExtremeNoise(-100.0));
        let r = model.generate();

        assert_abs_diff_eq!(r.voltage_v, 200.0, epsilon = 0.01);
        assert_abs_diff_eq!(r.current_a, 5.0, epsilon = 0.01);
        assert_abs_diff_eq!(r.power_factor, 0.75, epsilon = 0.01);
    }

    #[test]
    fn test_seeded_models_match() {
        let config = SignalConfig {
            seed: Some(7),
            ..Default::default()
        };
        let mut a = SignalModel::new(&config);
        let mut b = SignalModel::new(&config);

        for _ in 0..50 {
            assert_eq!(a.generate(), b.generate());
        }
    }

    #[test]
    fn test_custom_period() {
        let config = SignalConfig {
            cycle_period: 4,
            seed: None,
        };
        let mut model = SignalModel::with_noise(&config, ZeroNoise);
        let cycle: Vec<ReadingSet> = (0..4).map(|_| model.generate()).collect();
        let next: Vec<ReadingSet> = (0..4).map(|_| model.generate()).collect();

        assert_eq!(cycle, next);
        // Step 1 of 4 is the peak
        assert_abs_diff_eq!(cycle[0].current_a, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_period_is_treated_as_one() {
        let config = SignalConfig {
            cycle_period: 0,
            seed: None,
        };
        let mut model = SignalModel::with_noise(&config, ZeroNoise);
        assert_eq!(model.cycle_period(), 1);
        let r = model.generate();
        assert_abs_diff_eq!(r.current_a, 26.5, epsilon = 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23556, 3), 1.236);
        assert_eq!(round_to(220.0, 2), 220.0);
    }

    #[test]
    fn test_round_to_exact_halves_go_to_even() {
        assert_eq!(round_to(220.125, 2), 220.12);
        assert_eq!(round_to(220.375, 2), 220.38);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(-0.5, 0), -0.0);
    }
}
