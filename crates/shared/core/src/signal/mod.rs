//! Signal generation
//!
//! Per-twin electrical load model for an industrial oven. Current and power
//! factor follow a shared sinusoidal heating cycle, voltage carries independent
//! grid noise, and active power is always derived from the other three.
//!
//! Randomness is injected through [`NoiseSource`] so tests can swap in
//! [`ZeroNoise`] without touching clamping or rounding.

mod model;
mod noise;

pub use model::{Band, DEFAULT_CYCLE_PERIOD, SignalConfig, SignalModel, round_to};
pub use noise::{GaussianNoise, NoiseSource, ZeroNoise};
