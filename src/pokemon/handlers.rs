use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{error, instrument};

use super::dto::{Pokemon, PokemonList};
use crate::{
    cache::FetchError,
    error::{AppError, PathParam, QueryParams},
    state::AppState,
};

const DEFAULT_LIMIT: u32 = 20;
const DEFAULT_OFFSET: u32 = 0;

lazy_static! {
    static ref NAME_OR_ID_RE: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
}

/// Raw query values; anything unparsable falls back to the default.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn int_or(raw: Option<&str>, fallback: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(fallback)
}

impl Pagination {
    pub fn limit(&self) -> u32 {
        int_or(self.limit.as_deref(), DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        int_or(self.offset.as_deref(), DEFAULT_OFFSET)
    }
}

pub fn pokemon_routes() -> Router<AppState> {
    Router::new()
        .route("/pokemon", get(list_pokemon))
        .route("/pokemon/:name_or_id", get(get_pokemon))
}

fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        error!(error = %e, url, "upstream payload did not decode");
        AppError::Internal(anyhow::Error::new(e).context("decode upstream payload"))
    })
}

#[instrument(skip(state))]
pub async fn list_pokemon(
    State(state): State<AppState>,
    QueryParams(p): QueryParams<Pagination>,
) -> Result<Json<PokemonList>, AppError> {
    let url = format!(
        "{}/pokemon?offset={}&limit={}",
        state.config.pokeapi.base_url,
        p.offset(),
        p.limit()
    );
    let body = state.cache.fetch_cached(&url).await?;
    Ok(Json(decode(&url, &body)?))
}

#[instrument(skip(state))]
pub async fn get_pokemon(
    State(state): State<AppState>,
    PathParam(name_or_id): PathParam<String>,
) -> Result<Json<Pokemon>, AppError> {
    let key = name_or_id.trim().to_lowercase();
    if !NAME_OR_ID_RE.is_match(&key) {
        return Err(AppError::NotFound);
    }

    let url = format!("{}/pokemon/{}", state.config.pokeapi.base_url, key);
    let body = match state.cache.fetch_cached(&url).await {
        Ok(body) => body,
        Err(FetchError::UpstreamStatus(404)) => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };
    Ok(Json(decode(&url, &body)?))
}
