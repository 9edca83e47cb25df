use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::files::Caller;

/// Header carrying the caller identity.
pub const IDENTITY_HEADER: &str = "id";

/// The identity is opaque: any header bytes are accepted, decoded as UTF-8
/// with invalid sequences replaced.
fn caller_from_parts(parts: &Parts) -> Caller {
    match parts.headers.get(IDENTITY_HEADER) {
        None => Caller::Anonymous,
        Some(value) => Caller::new(Some(String::from_utf8_lossy(value.as_bytes()).as_ref())),
    }
}

/// Caller taken from the `id` header; absent or empty means anonymous.
pub struct AnyCaller(pub Caller);

impl<S> FromRequestParts<S> for AnyCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AnyCaller(caller_from_parts(parts)))
    }
}

/// Identified caller. Rejects the request with `IDENTITY_MISSING` when the
/// `id` header is absent or empty.
pub struct IdentifiedCaller(pub Caller);

impl<S> FromRequestParts<S> for IdentifiedCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match caller_from_parts(parts) {
            Caller::Anonymous => Err(AppError::IdentityMissing),
            caller => Ok(IdentifiedCaller(caller)),
        }
    }
}
