//! HTTP endpoints.
//!
//! - GET /api/range/{prefix} - suffixes under a 6-hex-character prefix
//! - GET /health             - liveness check

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use hibp_rangedb::{Prefix, RangeDb, encode_suffix};
use tracing::info;

use crate::error::ApiError;

/// Body of every 400 response.
pub const PREFIX_ERROR: &str = "prefix should be the first 6 characters of the SHA-1 password";

/// The database shared by all handlers. Read-only, so no lock.
pub type SharedDb = Arc<RangeDb>;

pub fn router(db: SharedDb) -> Router {
    Router::new()
        .route("/api/range/:prefix", get(fetch_prefix))
        .route("/health", get(health))
        .with_state(db)
}

async fn fetch_prefix(
    State(db): State<SharedDb>,
    prefix: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let start = Instant::now();

    // Undecodable segments (e.g. invalid UTF-8) get the same answer as bad hex.
    let Ok(Path(prefix)) = prefix else {
        return Err(ApiError::BadRequest);
    };
    let prefix = Prefix::from_hex(&prefix).map_err(|_| ApiError::BadRequest)?;

    // Positioned read on the blocking pool; the runtime threads stay free.
    let records = tokio::task::spawn_blocking(move || db.lookup(prefix)).await??;
    let hashes: Vec<String> = records.iter().map(encode_suffix).collect();

    info!("Prefix {} fetched, {} hashes, duration: {:?}", prefix, hashes.len(), start.elapsed());

    Ok(Json(hashes))
}

async fn health() -> &'static str {
    "ok"
}
