//! Credential sign-in.

use axum::{extract::Extension, response::Json};
use sqlx::PgPool;

use super::credentials;
use super::error::AuthError;
use super::session::{self, Claims};
use super::types::LoginRequest;

/// Authenticate a login/password pair and return session claims.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; session claims", body = Claims),
        (status = 400, description = "Missing fields, bad credentials or unverified email", body = crate::api::handlers::auth::types::MessageResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<Claims>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let identity = credentials::authenticate(&pool, &request.login, &request.password).await?;
    let claims =
        session::compose_claims(&pool, &Claims::from_identity(&identity), Some(&identity)).await?;

    Ok(Json(claims))
}
