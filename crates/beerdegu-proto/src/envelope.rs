//! The `{command, data}` envelope shared by both directions.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::errors::{ProtocolError, Result};

/// Raw frame envelope.
///
/// Inbound frames also carry a `timestamp`, which the client ignores, and
/// draft responses carry a top-level `beer_id` next to `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Command name.
    pub command: String,
    /// Command payload. Omitted on the wire when null.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    /// Beer the payload refers to (draft responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beer_id: Option<u64>,
}

impl Envelope {
    /// Create an envelope with a payload.
    pub fn new(command: impl Into<String>, data: Value) -> Self {
        Self { command: command.into(), data, beer_id: None }
    }

    /// Create an envelope without a payload.
    pub fn bare(command: impl Into<String>) -> Self {
        Self::new(command, Value::Null)
    }

    /// Attach a top-level beer reference.
    #[must_use]
    pub fn with_beer_id(mut self, beer_id: u64) -> Self {
        self.beer_id = Some(beer_id);
        self
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON text frame.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode the payload into `T`, attributing failures to this command.
    pub(crate) fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.data).map_err(|e| ProtocolError::invalid_payload(&self.command, e))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_envelope_omits_data() {
        let text = Envelope::bare("user_active").encode().unwrap();
        assert_eq!(text, r#"{"command":"user_active"}"#);
    }

    #[test]
    fn decode_ignores_timestamp() {
        let envelope = Envelope::decode(
            r#"{"command":"set_users","data":[],"timestamp":"2021-07-13T14:23:00+00:00"}"#,
        )
        .unwrap();

        assert_eq!(envelope.command, "set_users");
        assert_eq!(envelope.data, json!([]));
        assert_eq!(envelope.beer_id, None);
    }

    #[test]
    fn decode_rejects_missing_command() {
        assert!(Envelope::decode(r#"{"data":1}"#).is_err());
        assert!(Envelope::decode("not json").is_err());
    }
}
