//! REST API exposure
//!
//! Consumes a `ServerHost` and produces an Axum `Router` carrying health
//! checks, the generic CRUD routes, the domain routes and the HTTP layers.

use crate::handlers;
use crate::server::entity_registry::EntityRegistry;
use crate::server::host::ServerHost;
use crate::server::router::resource_registry;
use anyhow::Result;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct RestExposure;

impl RestExposure {
    /// Build the REST router for `host` with the built-in resources
    pub fn build_router(
        host: Arc<ServerHost>,
        custom_routes: Vec<Router<Arc<ServerHost>>>,
    ) -> Result<Router> {
        Self::build_router_with(host, &resource_registry(), custom_routes)
    }

    /// Build the REST router from an explicit registry
    ///
    /// Returns a fully configured router with:
    /// - Health check routes
    /// - CRUD routes of every registered resource
    /// - Domain routes (payments, payroll, reports, GST)
    /// - Custom routes
    pub fn build_router_with(
        host: Arc<ServerHost>,
        registry: &EntityRegistry,
        custom_routes: Vec<Router<Arc<ServerHost>>>,
    ) -> Result<Router> {
        let cors = Self::cors_layer(&host.config.server.cors_origins)?;

        let mut app = Self::health_routes()
            .merge(registry.build_routes())
            .merge(handlers::routes());
        for custom in custom_routes {
            app = app.merge(custom);
        }

        Ok(app
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(host))
    }

    fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
        let layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                HeaderName::from_static(crate::core::auth::USER_ID_HEADER),
                HeaderName::from_static(crate::core::auth::ROLE_HEADER),
                HeaderName::from_static(crate::core::auth::COMPANY_ID_HEADER),
            ]);

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            return Ok(layer.allow_origin(Any));
        }
        let origins = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o)
                    .map_err(|e| anyhow::anyhow!("invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(layer.allow_origin(AllowOrigin::list(origins)))
    }

    fn health_routes() -> Router<Arc<ServerHost>> {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "payroll-rs"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origins() {
        assert!(RestExposure::cors_layer(&[]).is_ok());
        assert!(RestExposure::cors_layer(&["*".to_string()]).is_ok());
        assert!(RestExposure::cors_layer(&["http://localhost:5173".to_string()]).is_ok());
        assert!(RestExposure::cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
