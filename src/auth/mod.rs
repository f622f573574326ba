use crate::state::AppState;
use axum::Router;

pub mod common_passwords;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod repo_types;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::account_routes())
        .merge(handlers::user_routes())
        .merge(handlers::admin_routes())
        .merge(handlers::basic_auth_routes(state))
}
