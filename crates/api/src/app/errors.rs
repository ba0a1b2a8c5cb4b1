use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use k6svc_events::{DecodeError, DispatchError, HandlerError};

pub fn decode_error_to_response(err: DecodeError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "decode_error", err.to_string())
}

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DispatchError::UnhandledType { .. } => {
            json_error(StatusCode::BAD_REQUEST, "unhandled_event_type", message)
        }
        DispatchError::Schema(_) => json_error(StatusCode::BAD_REQUEST, "schema_error", message),
        DispatchError::Handler(HandlerError::Send(_)) => {
            json_error(StatusCode::BAD_GATEWAY, "send_error", message)
        }
        DispatchError::Handler(HandlerError::Cancelled(_)) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "task_cancelled", message)
        }
        DispatchError::Handler(HandlerError::Failed(_)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "task_failed", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
