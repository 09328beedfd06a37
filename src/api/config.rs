//! HTTP server configuration loaded from the environment.

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone, Debug, Default)]
pub struct ApiConfig {
    /// Allowed CORS origins (from COURSEGEN_CORS_ORIGINS, comma-separated).
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("COURSEGEN_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());

        Self { cors_origins }
    }

    /// Allow any origin (local development and tests).
    pub fn permissive() -> Self {
        Self { cors_origins: None }
    }

    pub fn with_cors_origins(origins: Vec<String>) -> Self {
        Self {
            cors_origins: Some(origins),
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let Some(origins) = &self.cors_origins else {
            return CorsLayer::permissive();
        };

        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_has_no_origin_list() {
        assert!(ApiConfig::permissive().cors_origins.is_none());
    }

    #[test]
    fn explicit_origins_are_kept() {
        let config = ApiConfig::with_cors_origins(vec!["http://localhost:4200".to_string()]);
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://localhost:4200".to_string()])
        );
        let _ = config.cors_layer();
    }
}
