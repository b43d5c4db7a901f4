//! twinfeed Core Domain
//!
//! Pure domain types for the twin telemetry generator.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod envelope;
pub mod identity;
pub mod readings;
pub mod signal;
pub mod values;

// Re-export commonly used types at crate root
pub use envelope::{Envelope, FEATURES_PATH, FeatureProperties, FeatureUpdate, build_envelope};
pub use identity::{IdentityError, THING_ID_DELIMITER, ThingId};
pub use readings::{Feature, ReadingSet};
pub use signal::{GaussianNoise, NoiseSource, SignalConfig, SignalModel, ZeroNoise};
pub use values::{FeatureValue, Timestamp};
