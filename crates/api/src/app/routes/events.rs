//! CloudEvents receiver.
//!
//! Each request is dispatched on its own task with a child of the process
//! shutdown token. The request holds a drop guard on that token, so a client
//! that disconnects (or a shutdown) cancels the running action, which still
//! reports an errored finished event.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app::{errors, services::AppServices};
use crate::cloudevent;

/// POST {RCV_PATH}
pub async fn receive(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let envelope = match cloudevent::from_http(&headers, &body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode incoming cloudevent");
            return errors::decode_error_to_response(e);
        }
    };

    let cancel = services.shutdown().child_token();
    let guard = cancel.clone().drop_guard();
    let dispatcher = services.dispatcher().clone();

    let task = tokio::spawn(async move {
        dispatcher
            .dispatch_with_cancellation(envelope, cancel)
            .await
    });
    let joined = task.await;
    let _ = guard.disarm();

    match joined {
        Ok(Ok(())) => StatusCode::ACCEPTED.into_response(),
        Ok(Err(e)) => errors::dispatch_error_to_response(e),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            format!("handler task aborted: {e}"),
        ),
    }
}
