use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{cache::FetchError, db::StoreError, validator::Validator};

pub const BASIC_AUTH_CHALLENGE: &str = r#"Basic realm="restricted", charset="UTF-8""#;

/// Everything a handler can fail with. Server-side variants are logged in
/// full and reach the client as a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("one or more fields failed validation")]
    Validation(Validator),
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid authentication credentials")]
    Unauthorized,
    #[error("basic authentication required")]
    BasicAuthRequired,
    #[error("you do not have permission to access this resource")]
    Forbidden,
    #[error("the requested resource could not be found")]
    NotFound,
    #[error("the method is not supported for this resource")]
    MethodNotAllowed,
    #[error("upstream fetch failed")]
    Fetch(#[from] FetchError),
    #[error("store failure")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<Validator> for AppError {
    fn from(v: Validator) -> Self {
        AppError::Validation(v)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody<'a> {
    status: &'a str,
    error: String,
    #[serde(flatten)]
    validation: Option<Validator>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::BasicAuthRequired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Fetch(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_failed",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized | AppError::BasicAuthRequired => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound => "not_found",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::Fetch(_) | AppError::Store(_) | AppError::Internal(_) => "server_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let message = if status.is_server_error() {
            error!(error = %self_chain(&self), "request failed");
            "the server encountered a problem and could not process your request".to_string()
        } else {
            self.to_string()
        };

        let challenge = matches!(self, AppError::BasicAuthRequired);
        let validation = match self {
            AppError::Validation(v) => Some(v),
            _ => None,
        };

        let mut res = (
            status,
            Json(ErrorBody {
                status: kind,
                error: message,
                validation,
            }),
        )
            .into_response();

        if challenge {
            res.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_AUTH_CHALLENGE),
            );
        }
        res
    }
}

/// Renders the full source chain so the log line carries every cause.
fn self_chain(err: &AppError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// `axum::Json` with rejections reported through [`AppError`].
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let rejection: JsonRejection = rejection;
                warn!(error = %rejection.body_text(), "malformed request body");
                Err(AppError::BadRequest(rejection.body_text()))
            }
        }
    }
}

/// `axum::extract::Query` with rejections reported through [`AppError`].
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                let rejection: QueryRejection = rejection;
                warn!(error = %rejection.body_text(), "malformed query string");
                Err(AppError::BadRequest(rejection.body_text()))
            }
        }
    }
}

/// `axum::extract::Path` with rejections reported through [`AppError`].
/// A segment that cannot be decoded names no resource, so it is a 404.
#[derive(Debug)]
pub struct PathParam<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                debug!(error = %e.body_text(), "undecodable path parameter");
                Err(AppError::NotFound)
            }
            Err(rejection) => Err(AppError::Internal(anyhow::anyhow!(
                "path extraction failed: {}",
                rejection.body_text()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let err = AppError::Internal(anyhow::anyhow!("SELECT * FROM secrets failed"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["Status"], "server_error");
        assert!(!body["Error"].as_str().unwrap().contains("secrets"));
    }

    #[tokio::test]
    async fn validation_carries_field_errors() {
        let mut v = Validator::new();
        v.add_field_error("Email", "Email is already in use");
        let res = AppError::from(v).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(res).await;
        assert_eq!(body["Status"], "validation_failed");
        assert_eq!(body["FieldErrors"]["Email"][0], "Email is already in use");
    }

    #[tokio::test]
    async fn basic_auth_rejection_sets_challenge() {
        let res = AppError::BasicAuthRequired.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            BASIC_AUTH_CHALLENGE
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store(StoreError::Duplicate).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
