use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use k6svc_core::{EventId, KeptnContext};

use crate::error::{DecodeError, SchemaError};

/// The only CloudEvents spec version accepted and produced.
pub const SPEC_VERSION: &str = "1.0";

/// Content type of the `data` attribute on outbound events.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Envelope for an event (CloudEvents 1.0 structured mode + Keptn extensions).
///
/// This is the unit received from and sent to the event bus.
///
/// Notes:
/// - **Correlation** runs through `shkeptncontext`; every event of one workflow
///   run shares it.
/// - `triggeredid` links a started/finished notification back to its trigger.
/// - `data` stays untyped here; callers pick the schema with [`Envelope::data_as`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default = "default_spec_version")]
    specversion: String,

    id: EventId,
    source: String,

    #[serde(rename = "type")]
    event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    datacontenttype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    shkeptncontext: Option<KeptnContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    triggeredid: Option<EventId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    shkeptnspecversion: Option<String>,

    #[serde(default)]
    data: JsonValue,
}

fn default_spec_version() -> String {
    SPEC_VERSION.to_string()
}

impl Envelope {
    pub fn new(
        id: EventId,
        source: impl Into<String>,
        event_type: impl Into<String>,
        data: JsonValue,
    ) -> Self {
        Self {
            specversion: default_spec_version(),
            id,
            source: source.into(),
            event_type: event_type.into(),
            time: None,
            datacontenttype: None,
            shkeptncontext: None,
            triggeredid: None,
            shkeptnspecversion: None,
            data,
        }
    }

    /// Decode a structured-mode JSON body.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let envelope: Envelope =
            serde_json::from_slice(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Encode as a structured-mode JSON body.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Check the required CloudEvents attributes.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.specversion != SPEC_VERSION {
            return Err(DecodeError::UnsupportedSpecVersion(self.specversion.clone()));
        }
        if self.id.as_str().trim().is_empty() {
            return Err(DecodeError::MissingAttribute("id"));
        }
        if self.source.trim().is_empty() {
            return Err(DecodeError::MissingAttribute("source"));
        }
        if self.event_type.trim().is_empty() {
            return Err(DecodeError::MissingAttribute("type"));
        }
        Ok(())
    }

    /// Deserialize `data` into the schema the caller expects.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, SchemaError> {
        T::deserialize(&self.data).map_err(|e| SchemaError {
            event_type: self.event_type.clone(),
            message: e.to_string(),
        })
    }

    pub fn with_spec_version(mut self, specversion: impl Into<String>) -> Self {
        self.specversion = specversion.into();
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.datacontenttype = Some(content_type.into());
        self
    }

    pub fn with_context(mut self, context: Option<KeptnContext>) -> Self {
        self.shkeptncontext = context;
        self
    }

    pub fn with_triggered_id(mut self, triggered_id: Option<EventId>) -> Self {
        self.triggeredid = triggered_id;
        self
    }

    pub fn with_keptn_spec_version(mut self, version: Option<String>) -> Self {
        self.shkeptnspecversion = version;
        self
    }

    pub fn spec_version(&self) -> &str {
        &self.specversion
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub fn content_type(&self) -> Option<&str> {
        self.datacontenttype.as_deref()
    }

    pub fn context(&self) -> Option<&KeptnContext> {
        self.shkeptncontext.as_ref()
    }

    pub fn triggered_id(&self) -> Option<&EventId> {
        self.triggeredid.as_ref()
    }

    pub fn keptn_spec_version(&self) -> Option<&str> {
        self.shkeptnspecversion.as_deref()
    }

    pub fn data(&self) -> &JsonValue {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::TestTriggeredEventData;
    use serde_json::json;

    fn trigger_json() -> serde_json::Value {
        json!({
            "specversion": "1.0",
            "id": "evt-1",
            "source": "shipyard-controller",
            "type": "sh.keptn.event.test.triggered",
            "time": "2021-01-01T10:00:00Z",
            "datacontenttype": "application/json",
            "shkeptncontext": "ctx-1",
            "shkeptnspecversion": "0.2.0",
            "someextension": "ignored",
            "data": {
                "project": "sockshop",
                "stage": "dev",
                "service": "carts",
                "test": { "teststrategy": "functional" }
            }
        })
    }

    #[test]
    fn decodes_structured_event() {
        let raw = serde_json::to_vec(&trigger_json()).unwrap();
        let env = Envelope::decode(&raw).unwrap();

        assert_eq!(env.id().as_str(), "evt-1");
        assert_eq!(env.event_type(), "sh.keptn.event.test.triggered");
        assert_eq!(env.context().map(|c| c.as_str()), Some("ctx-1"));
        assert_eq!(env.keptn_spec_version(), Some("0.2.0"));
        assert_eq!(env.triggered_id(), None);
        assert!(env.time().is_some());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(
            Envelope::decode(b"{not json"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            Envelope::decode(b"[1, 2, 3]"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn empty_required_attribute_is_a_decode_error() {
        let mut v = trigger_json();
        v["type"] = json!("");
        let raw = serde_json::to_vec(&v).unwrap();
        assert_eq!(
            Envelope::decode(&raw),
            Err(DecodeError::MissingAttribute("type"))
        );
    }

    #[test]
    fn rejects_other_spec_versions() {
        let mut v = trigger_json();
        v["specversion"] = json!("0.3");
        let raw = serde_json::to_vec(&v).unwrap();
        assert!(matches!(
            Envelope::decode(&raw),
            Err(DecodeError::UnsupportedSpecVersion(v)) if v == "0.3"
        ));
    }

    #[test]
    fn typed_payload_and_schema_mismatch() {
        let raw = serde_json::to_vec(&trigger_json()).unwrap();
        let env = Envelope::decode(&raw).unwrap();
        let data: TestTriggeredEventData = env.data_as().unwrap();
        assert_eq!(data.test.test_strategy, "functional");

        let bad = Envelope::new(
            EventId::from("evt-2"),
            "src",
            "sh.keptn.event.test.triggered",
            json!({ "test": { "teststrategy": 42 } }),
        );
        let err = bad.data_as::<TestTriggeredEventData>().unwrap_err();
        assert_eq!(err.event_type, "sh.keptn.event.test.triggered");
    }

    #[test]
    fn encode_omits_unset_attributes() {
        let env = Envelope::new(EventId::from("e"), "k6-service", "t", json!({}));
        let v: serde_json::Value = serde_json::from_slice(&env.encode().unwrap()).unwrap();
        assert_eq!(v["specversion"], "1.0");
        assert!(v.get("shkeptncontext").is_none());
        assert!(v.get("triggeredid").is_none());
    }
}
