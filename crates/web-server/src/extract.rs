use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Header carrying the caller's identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, taken from the `X-User-Id` header.
///
/// Token issuance lives in front of this service; by the time a request
/// arrives here the header is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".to_string()))?;
        let raw = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("X-User-Id header is not valid text".to_string()))?;
        Uuid::parse_str(raw.trim())
            .map(CurrentUser)
            .map_err(|_| AppError::Unauthorized("X-User-Id header is not a valid UUID".to_string()))
    }
}
