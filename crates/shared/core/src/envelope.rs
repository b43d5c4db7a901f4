//! Eclipse Ditto protocol envelopes
//!
//! A single envelope replaces all features of a twin in one `modify` command:
//!
//! ```text
//! {
//!   "topic": "org.openegiz/oven-01/things/twin/commands/modify",
//!   "path": "/features",
//!   "value": {
//!     "voltage_v": { "properties": { "value": 221.4, "timestamp": "..." } },
//!     ...
//!   }
//! }
//! ```

use chrono::SecondsFormat;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::identity::{IdentityError, ThingId};
use crate::readings::ReadingSet;
use crate::values::{FeatureValue, Timestamp};

/// Ditto path for a whole-features update
pub const FEATURES_PATH: &str = "/features";

/// Render a timestamp as ISO-8601 with microseconds and an explicit offset
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Properties carried by one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub value: FeatureValue,
    pub timestamp: String,
}

/// Feature payload wrapper (`{"properties": {...}}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureUpdate {
    pub properties: FeatureProperties,
}

/// Ditto protocol message updating every feature of a twin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    topic: String,
    path: String,
    value: IndexMap<String, FeatureUpdate>,
}

impl Envelope {
    /// Build the envelope for a parsed identity
    ///
    /// The timestamp is formatted once and shared by all features.
    pub fn for_thing(thing_id: &ThingId, readings: &ReadingSet, timestamp: Timestamp) -> Self {
        let timestamp = format_timestamp(&timestamp);

        let value = readings
            .iter()
            .map(|(feature, value)| {
                let update = FeatureUpdate {
                    properties: FeatureProperties {
                        value,
                        timestamp: timestamp.clone(),
                    },
                };
                (feature.name().to_string(), update)
            })
            .collect();

        Self {
            topic: thing_id.modify_topic(),
            path: FEATURES_PATH.to_string(),
            value,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Feature updates in emission order
    pub fn features(&self) -> impl Iterator<Item = (&str, &FeatureUpdate)> {
        self.value.iter().map(|(name, update)| (name.as_str(), update))
    }

    /// Look up one feature by name
    pub fn feature(&self, name: &str) -> Option<&FeatureUpdate> {
        self.value.get(name)
    }

    /// Compact JSON encoding
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Build an envelope from a raw `namespace:name` identity
///
/// Fails without producing anything when the identity has no delimiter.
pub fn build_envelope(
    identity: &str,
    readings: &ReadingSet,
    timestamp: Timestamp,
) -> Result<Envelope, IdentityError> {
    let thing_id = ThingId::parse(identity)?;
    Ok(Envelope::for_thing(&thing_id, readings, timestamp))
}
