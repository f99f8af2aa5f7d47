use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use crate::application::ServiceError;
use crate::domain::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The requesting user, taken from the `x-user-id` header set by the
/// upstream auth proxy. Authentication itself happens before this service;
/// a missing or malformed header is a client error, not an auth failure.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub UserId);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::from(ServiceError::validation(
                    "identity",
                    "Missing x-user-id header",
                ))
            })?;

        let user_id = Uuid::parse_str(raw).map_err(|_| {
            ApiError::from(ServiceError::validation(
                "identity",
                "x-user-id header must be a UUID",
            ))
        })?;

        Ok(CallerIdentity(UserId::from_uuid(user_id)))
    }
}
