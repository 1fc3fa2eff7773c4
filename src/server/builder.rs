//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::EntityRegistry;
use super::exposure::RestExposure;
use super::host::ServerHost;
use super::router::resource_registry;
use crate::config::AppConfig;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the payroll HTTP server
///
/// # Example
///
/// ```ignore
/// ServerBuilder::new()
///     .with_config(AppConfig::from_yaml_file("payroll.yaml")?)
///     .serve("127.0.0.1:3000")
///     .await?;
/// ```
pub struct ServerBuilder {
    config: Option<AppConfig>,
    host: Option<Arc<ServerHost>>,
    registry: EntityRegistry,
    custom_routes: Vec<Router<Arc<ServerHost>>>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            host: None,
            registry: resource_registry(),
            custom_routes: Vec::new(),
        }
    }

    /// Configuration used when no host is given; in-memory storage
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Serve an already built host (any storage backend)
    pub fn with_host(mut self, host: impl Into<Arc<ServerHost>>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add routes that do not fit the CRUD pattern
    pub fn with_custom_routes(mut self, routes: Router<Arc<ServerHost>>) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// The host to serve: the given one, or an in-memory host over the config
    pub fn build_host(&mut self) -> Arc<ServerHost> {
        match self.host.take() {
            Some(host) => host,
            None => {
                let config = self.config.take().unwrap_or_else(AppConfig::with_defaults);
                Arc::new(ServerHost::in_memory(config))
            }
        }
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let host = self.build_host();
        let custom_routes = std::mem::take(&mut self.custom_routes);
        RestExposure::build_router_with(host, &self.registry, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds `addr`, serves until SIGTERM or Ctrl+C, then drains connections.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves, so the other signal
/// still shuts the server down.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use rust_decimal::Decimal;

    #[test]
    fn test_new_builder_has_all_resources() {
        let builder = ServerBuilder::new();
        assert!(builder.config.is_none());
        assert!(builder.host.is_none());
        assert_eq!(builder.registry.entity_types().len(), 12);
    }

    #[test]
    fn test_build_host_uses_config() {
        let mut config = AppConfig::with_defaults();
        config.payroll.default_working_days = Decimal::from(22);
        let mut builder = ServerBuilder::new().with_config(config);
        let host = builder.build_host();
        assert_eq!(host.config.payroll.default_working_days, Decimal::from(22));
    }

    #[test]
    fn test_given_host_wins_over_config() {
        let host = Arc::new(ServerHost::in_memory(AppConfig::with_defaults()));
        let mut builder = ServerBuilder::new()
            .with_config(AppConfig::default())
            .with_host(host.clone());
        assert!(Arc::ptr_eq(&builder.build_host(), &host));
    }

    #[test]
    fn test_build_with_custom_routes() {
        let router = ServerBuilder::new()
            .with_custom_routes(Router::new().route("/version", get(|| async { "1" })))
            .build();
        assert!(router.is_ok());
    }
}
