use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::{middleware::Identity, repo_types::User};
use crate::error::AppError;

/// The authenticated user attached by the authentication middleware.
/// Rejects with 401 when the request is anonymous.
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .and_then(Identity::user)
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
