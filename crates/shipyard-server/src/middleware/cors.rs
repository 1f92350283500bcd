//! CORS layer construction

use http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};

/// Build the CORS layer from an `ALLOW_ORIGINS` value
///
/// `*` (or an empty value) allows any origin, method and header, without
/// credentials. A comma-separated list allows exactly those origins, with
/// credentials, mirroring the requested method and headers.
pub fn build_cors_layer(allow_origins: &str) -> CorsLayer {
    let origins: Vec<&str> = allow_origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    if origins.is_empty() || origins.contains(&"*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origin_list: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origin_list)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
