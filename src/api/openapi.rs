use super::handlers::{auth, health};
use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::verification::verify_email))
        .routes(routes!(auth::verification::resend_verification))
        .routes(routes!(auth::reset::request_reset))
        .routes(routes!(auth::reset::reset_password))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::providers::providers));

    let mut auth_tag = Tag::new("auth");
    auth_tag.description =
        Some("Registration, verification, password reset, and sign-in".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service and dependency health".to_string());

    router.get_openapi_mut().tags = Some(vec![auth_tag, health_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_auth_routes() {
        let spec = openapi();
        let paths = &spec.paths.paths;
        for path in [
            "/register",
            "/verify-email",
            "/resend-verification",
            "/request-reset",
            "/reset-password",
            "/login",
            "/providers",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }

    #[test]
    fn openapi_uses_cargo_metadata() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }
}
