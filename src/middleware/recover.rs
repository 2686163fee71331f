//! Panic containment
//!
//! Wraps every handler so a panic while processing one request becomes an
//! InternalFault response for that request only.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use tracing::error;

use crate::error::{GatewayError, ProtocolFamily};

/// Panic-catching middleware.
///
/// The error is rendered for the protocol family implied by the path; the
/// panic payload is logged and never sent to the client.
pub async fn catch_panics(request: Request, next: Next) -> Response {
    let family = ProtocolFamily::from_path(request.uri().path());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let detail = panic_message(&*payload);
            error!(method = %method, path = %path, panic = %detail, "Handler panicked");
            GatewayError::Internal(detail)
                .for_family(family)
                .into_response()
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
