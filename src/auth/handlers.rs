use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AdminChangePasswordRequest, ChangePasswordRequest, CredentialsRequest, PublicUser,
            TokenResponse,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        middleware::{require_admin_user, require_authenticated_user, require_basic_authentication},
        password::{
            check_new_password, hash_password_blocking, verify_password_blocking,
            UNMATCHABLE_HASH,
        },
    },
    db::StoreError,
    error::{AppError, JsonBody},
    state::AppState,
    validator::{is_valid_email, Validator},
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/authentication-tokens", post(create_authentication_token))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/protected", get(protected))
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn(require_authenticated_user))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/protected", get(protected))
        .route("/admin/users", get(list_users))
        .route("/admin/change-user-password", post(change_user_password))
        .route_layer(middleware::from_fn(require_admin_user))
        .route_layer(middleware::from_fn(require_authenticated_user))
}

pub fn basic_auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/basic-auth-protected", get(protected))
        .route_layer(middleware::from_fn_with_state(
            state,
            require_basic_authentication,
        ))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<StatusCode, AppError> {
    let email = normalize_email(&payload.email);
    let mut v = Validator::new();

    if email.is_empty() {
        v.add_field_error("Email", "Email is required");
    } else if !is_valid_email(&email) {
        v.add_field_error("Email", "Must be a valid email address");
    } else if state.users.find_by_email(&email).await?.is_some() {
        v.add_field_error("Email", "Email is already in use");
    }
    check_new_password(&mut v, "Password", &payload.password);

    if v.has_errors() {
        warn!(fields = ?v.field_errors.keys().collect::<Vec<_>>(), "registration rejected");
        return Err(v.into());
    }

    let hash = hash_password_blocking(payload.password).await?;

    match state.users.create(&email, &hash).await {
        Ok(user) => {
            info!(user_id = user.id, "user registered");
            Ok(StatusCode::NO_CONTENT)
        }
        // lost a race with a concurrent registration for the same email
        Err(StoreError::Duplicate) => {
            let mut v = Validator::new();
            v.add_field_error("Email", "Email is already in use");
            Err(v.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, keys, payload))]
pub async fn create_authentication_token(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = normalize_email(&payload.email);

    let mut v = Validator::new();
    v.check_field(!email.is_empty(), "Email", "Email is required");
    v.check_field(!payload.password.is_empty(), "Password", "Password is required");
    v.finish()?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        verify_password_blocking(payload.password, UNMATCHABLE_HASH.to_string()).await?;
        warn!("login for unknown email");
        return Err(AppError::Unauthorized);
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login with wrong password");
        return Err(AppError::Unauthorized);
    }

    let issued = keys.issue(user.id)?;
    info!(user_id = user.id, "authentication token issued");
    Ok(Json(TokenResponse {
        token: issued.token,
        expiry: issued.expires_at,
    }))
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    let mut v = Validator::new();
    if payload.current_password.is_empty() {
        v.add_field_error("CurrentPassword", "Current password is required");
    } else if !verify_password_blocking(
        payload.current_password.clone(),
        user.password_hash.clone(),
    )
    .await?
    {
        v.add_field_error("CurrentPassword", "Current password is incorrect");
    }
    check_new_password(&mut v, "NewPassword", &payload.new_password);
    v.finish()?;

    let hash = hash_password_blocking(payload.new_password).await?;
    state.users.update_password(user.id, &hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn protected() -> &'static str {
    "This is a protected handler"
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, admin, payload), fields(admin_id = admin.id))]
pub async fn change_user_password(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    JsonBody(payload): JsonBody<AdminChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    let mut v = Validator::new();
    let target = match payload.user_id {
        None => {
            v.add_field_error("UserID", "UserID is required");
            None
        }
        Some(id) => {
            let found = state.users.find_by_id(id).await?;
            v.check_field(found.is_some(), "UserID", "User could not be found");
            found
        }
    };
    check_new_password(&mut v, "NewPassword", &payload.new_password);
    v.finish()?;

    let Some(target) = target else {
        return Err(AppError::NotFound);
    };

    let hash = hash_password_blocking(payload.new_password).await?;
    if !state.users.update_password(target.id, &hash).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = target.id, "password reset by admin");
    Ok(StatusCode::NO_CONTENT)
}
