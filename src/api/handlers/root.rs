use axum::response::IntoResponse;

// Undocumented convenience route; health lives at /health.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn root_returns_name_and_version() {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
