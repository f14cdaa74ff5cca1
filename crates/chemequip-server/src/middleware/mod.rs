//! HTTP middleware: CORS and request tracing

use axum::http::{header, HeaderName, Method};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::CorsConfig;
use crate::features::datasets::routes::REPORT_DIGEST_HEADER;

/// Create CORS layer from configuration
///
/// An empty list or `*` allows any origin. Credentials are only honoured
/// with an explicit origin list, since browsers reject them next to `*`.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(REPORT_DIGEST_HEADER),
        ])
        .max_age(Duration::from_secs(3600));

    let wildcard = config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*");
    if wildcard {
        return cors.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    let cors = cors.allow_origin(origins);
    if config.allow_credentials {
        cors.allow_credentials(true)
    } else {
        cors
    }
}

/// Create tracing/logging layer
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_with_specific_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string(), "not a header\n".to_string()],
            allow_credentials: true,
        };
        let _layer = cors_layer(&config);
    }

    #[test]
    fn test_cors_layer_with_wildcard_and_credentials() {
        let config = CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        };
        let _layer = cors_layer(&config);
    }

    #[test]
    fn test_cors_layer_with_empty_origins() {
        let config = CorsConfig {
            allowed_origins: vec![],
            allow_credentials: false,
        };
        let _layer = cors_layer(&config);
    }
}
