use chrono::{DateTime, Utc};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Feature value, in the SI or ratio unit named by the feature
pub type FeatureValue = f64;
