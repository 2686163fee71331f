//! Fallback for unmatched requests
//!
//! Unknown paths and known paths hit with the wrong method both get a
//! structured not-found error in the family implied by the path prefix.

use axum::http::{Method, Uri};

use crate::error::{FamilyError, GatewayError, ProtocolFamily};

/// Not-found handler
pub async fn not_found(method: Method, uri: Uri) -> FamilyError {
    let path = uri.path();
    GatewayError::not_found(method.as_str(), path).for_family(ProtocolFamily::from_path(path))
}
