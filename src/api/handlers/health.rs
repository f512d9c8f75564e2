use super::auth::AuthState;
use crate::GIT_COMMIT_HASH;
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgPool};
use std::sync::Arc;
use tracing::{debug, error, info_span, Instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
    counter_store: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Database and counter store are healthy", body = [Health]),
        (status = 503, description = "Database or counter store is unhealthy", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(pool: Extension<PgPool>, state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let acquire_span = info_span!(
        "db.acquire",
        db.system = "postgresql",
        db.operation = "ACQUIRE"
    );
    let database_ok = match pool.0.acquire().instrument(acquire_span).await {
        Ok(mut conn) => {
            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            match conn.ping().instrument(ping_span).await {
                Ok(()) => true,
                Err(error) => {
                    error!("Failed to ping database: {}", error);

                    false
                }
            }
        }

        Err(error) => {
            error!("Failed to acquire database connection: {}", error);

            false
        }
    };

    let counter_store_ok = match state.limiter().store().ping().await {
        Ok(()) => true,
        Err(error) => {
            error!("Failed to ping counter store: {}", error);

            false
        }
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "ok" } else { "error" }.to_string(),
        counter_store: if counter_store_ok { "ok" } else { "error" }.to_string(),
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let mut headers = HeaderMap::new();
    if let Ok(x_app) = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
    {
        debug!("X-App header: {:?}", x_app);
        headers.insert("X-App", x_app);
    }

    let status = if database_ok && counter_store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, headers, Json(health))
}
