use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Separator between namespace and name in a thing ID
pub const THING_ID_DELIMITER: char = ':';

/// Errors raised while parsing a twin identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("malformed thing ID {0:?}: expected <namespace>:<name>")]
    MalformedIdentity(String),
}

/// Identity of a simulated twin (`namespace:name`)
///
/// Parsing splits on the first delimiter only, so the name may itself
/// contain further `:` characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThingId {
    namespace: String,
    name: String,
}

impl ThingId {
    /// Parse a `namespace:name` identity
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        match raw.split_once(THING_ID_DELIMITER) {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => Ok(Self {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            _ => Err(IdentityError::MalformedIdentity(raw.to_string())),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ditto command topic for a full feature update
    pub fn modify_topic(&self) -> String {
        format!("{}/{}/things/twin/commands/modify", self.namespace, self.name)
    }

    /// Broker destination the Ditto source connection listens on
    pub fn telemetry_topic(&self) -> String {
        format!("telemetry/{}", self)
    }
}

impl std::fmt::Display for ThingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.namespace, THING_ID_DELIMITER, self.name)
    }
}

impl FromStr for ThingId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ThingId {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ThingId> for String {
    fn from(id: ThingId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespace_and_name() {
        let id = ThingId::parse("org.openegiz:oven-01").unwrap();
        assert_eq!(id.namespace(), "org.openegiz");
        assert_eq!(id.name(), "oven-01");
        assert_eq!(id.to_string(), "org.openegiz:oven-01");
    }

    #[test]
    fn test_parse_splits_on_first_delimiter() {
        let id = ThingId::parse("plant:line:oven-7").unwrap();
        assert_eq!(id.namespace(), "plant");
        assert_eq!(id.name(), "line:oven-7");
        assert_eq!(id.to_string(), "plant:line:oven-7");
    }

    #[test]
    fn test_missing_delimiter_is_malformed() {
        assert_eq!(
            ThingId::parse("oven01"),
            Err(IdentityError::MalformedIdentity("oven01".to_string()))
        );
    }

    #[test]
    fn test_empty_parts_are_malformed() {
        assert!(ThingId::parse(":oven-01").is_err());
        assert!(ThingId::parse("org.openegiz:").is_err());
        assert!(ThingId::parse("").is_err());
    }

    #[test]
    fn test_topics() {
        let id: ThingId = "org.openegiz:oven-02".parse().unwrap();
        assert_eq!(
            id.modify_topic(),
            "org.openegiz/oven-02/things/twin/commands/modify"
        );
        assert_eq!(id.telemetry_topic(), "telemetry/org.openegiz:oven-02");
    }

    #[test]
    fn test_serde_as_string() {
        let id = ThingId::parse("org.openegiz:oven-01").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"org.openegiz:oven-01\"");

        let back: ThingId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<ThingId, _> = serde_json::from_str("\"oven01\"");
        assert!(bad.is_err());
    }
}
