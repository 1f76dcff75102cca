use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{EntityKind, Side};

/// Marker identifying this bridge to downstream consumers.
pub const ORIGIN_TAG: &str = "im-scratch";

pub const TOPIC_PREFIX: &str = "im/command";

/// Canonical command names that are not raw menu actions.
pub mod command {
    pub const SET: &str = "set";
    pub const COLORIZE: &str = "colorize";
    pub const FACETRACK_MOVE: &str = "facetrackmove";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// `im/command/<entity-instance>/<command>`, where the entity instance is
    /// prefixed by the side for lateral entities (`rightarm`, `lefthand`).
    pub fn for_command(entity: EntityKind, side: Option<Side>, command: &str) -> Self {
        let instance = match side {
            Some(side) => format!("{}{}", side.as_str(), entity.as_str()),
            None => entity.as_str().to_string(),
        };
        Topic(format!("{TOPIC_PREFIX}/{instance}/{}", command.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON body of a published command. Optional fields are omitted, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub origin: String,
    #[serde(
        rename = "absPosition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub abs_position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb: Option<String>,
}

impl CommandPayload {
    pub fn bare() -> Self {
        Self {
            origin: ORIGIN_TAG.to_string(),
            abs_position: None,
            rgb: None,
        }
    }

    pub fn position(abs_position: i32) -> Self {
        Self {
            abs_position: Some(abs_position),
            ..Self::bare()
        }
    }

    pub fn color(rgb: impl Into<String>) -> Self {
        Self {
            rgb: Some(rgb.into()),
            ..Self::bare()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub topic: Topic,
    pub payload: CommandPayload,
}

impl NormalizedMessage {
    pub fn new(topic: Topic, payload: CommandPayload) -> Self {
        Self { topic, payload }
    }

    pub fn payload_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_payload_has_only_origin() {
        let json = serde_json::to_string(&CommandPayload::bare()).expect("json");
        assert_eq!(json, r#"{"origin":"im-scratch"}"#);
    }

    #[test]
    fn position_payload_uses_camel_case_key() {
        let json = serde_json::to_string(&CommandPayload::position(0)).expect("json");
        assert_eq!(json, r#"{"origin":"im-scratch","absPosition":0}"#);
    }

    #[test]
    fn topic_prefixes_side_onto_entity() {
        let topic = Topic::for_command(EntityKind::Hand, Some(Side::Left), "set");
        assert_eq!(topic.as_str(), "im/command/lefthand/set");
        let topic = Topic::for_command(EntityKind::Eyes, None, "colorize");
        assert_eq!(topic.as_str(), "im/command/eyes/colorize");
    }
}
