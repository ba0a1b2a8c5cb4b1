//! CloudEvents HTTP binding (receiving side).
//!
//! Two content modes are accepted:
//! - **structured**: the body is the whole envelope as JSON
//!   (`application/cloudevents+json`, or plain JSON without `ce-*` headers)
//! - **binary**: attributes travel as `ce-*` headers, the body is `data`

use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use k6svc_core::{EventId, KeptnContext};
use k6svc_events::{DecodeError, Envelope};

const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";
const HEADER_PREFIX: &str = "ce-";

/// Decode an inbound HTTP request into an envelope.
pub fn from_http(headers: &HeaderMap, body: &[u8]) -> Result<Envelope, DecodeError> {
    let content_type = header(headers, CONTENT_TYPE.as_str());

    let structured = content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with(STRUCTURED_CONTENT_TYPE));

    if !structured && header(headers, "ce-specversion").is_some() {
        from_binary(headers, content_type, body)
    } else {
        Envelope::decode(body)
    }
}

fn from_binary(
    headers: &HeaderMap,
    content_type: Option<String>,
    body: &[u8],
) -> Result<Envelope, DecodeError> {
    let attr = |name: &str| header(headers, &format!("{HEADER_PREFIX}{name}"));
    let required = |name: &'static str| attr(name).ok_or(DecodeError::MissingAttribute(name));

    let data = if body.iter().all(u8::is_ascii_whitespace) {
        JsonValue::Null
    } else {
        serde_json::from_slice(body).map_err(|e| DecodeError::Malformed(format!("data: {e}")))?
    };

    let mut envelope = Envelope::new(
        EventId::from(required("id")?),
        required("source")?,
        required("type")?,
        data,
    )
    .with_spec_version(required("specversion")?)
    .with_context(attr("shkeptncontext").map(KeptnContext::from))
    .with_triggered_id(attr("triggeredid").map(EventId::from))
    .with_keptn_spec_version(attr("shkeptnspecversion"));

    if let Some(ct) = content_type {
        envelope = envelope.with_content_type(ct);
    }
    if let Some(raw) = attr("time") {
        let time = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| DecodeError::Malformed(format!("time: {e}")))?;
        envelope = envelope.with_time(time.with_timezone(&Utc));
    }

    envelope.validate()?;
    Ok(envelope)
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
