use serde::{Deserialize, Serialize};

use crate::values::FeatureValue;

/// Telemetry features reported by every twin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// RMS supply voltage (V)
    VoltageV,
    /// RMS line current (A)
    CurrentA,
    /// Active power (kW)
    ActivePowerKw,
    /// Power factor (cos φ)
    PowerFactor,
}

impl Feature {
    /// All features, in emission order
    pub const ALL: [Feature; 4] = [
        Feature::VoltageV,
        Feature::CurrentA,
        Feature::ActivePowerKw,
        Feature::PowerFactor,
    ];

    /// Feature name as used in Ditto paths
    pub fn name(&self) -> &'static str {
        match self {
            Feature::VoltageV => "voltage_v",
            Feature::CurrentA => "current_a",
            Feature::ActivePowerKw => "active_power_kw",
            Feature::PowerFactor => "power_factor",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One coherent set of readings for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingSet {
    pub voltage_v: FeatureValue,
    pub current_a: FeatureValue,
    pub active_power_kw: FeatureValue,
    pub power_factor: FeatureValue,
}

impl ReadingSet {
    /// Value of a single feature
    pub fn get(&self, feature: Feature) -> FeatureValue {
        match feature {
            Feature::VoltageV => self.voltage_v,
            Feature::CurrentA => self.current_a,
            Feature::ActivePowerKw => self.active_power_kw,
            Feature::PowerFactor => self.power_factor,
        }
    }

    /// Iterate `(feature, value)` pairs in emission order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, FeatureValue)> + '_ {
        Feature::ALL.into_iter().map(|f| (f, self.get(f)))
    }
}
