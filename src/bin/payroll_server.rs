//! payroll-server
//!
//! Environment:
//! - `PAYROLL_CONFIG`: YAML configuration file (defaults built in)
//! - `PAYROLL_BIND`: `host:port`, overrides `server.host` / `server.port`
//! - `RUST_LOG`: tracing filter, overrides `log.filter`

use anyhow::Context;
use payroll::config::AppConfig;
use payroll::server::{ServerBuilder, ServerHost};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = match std::env::var("PAYROLL_CONFIG") {
        Ok(path) => AppConfig::from_yaml_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        Err(_) => AppConfig::with_defaults(),
    };
    if let Ok(bind) = std::env::var("PAYROLL_BIND") {
        config = config.with_bind(&bind)?;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = config.bind_addr()?;
    tracing::info!(
        backend = ?config.storage.backend,
        working_days = %config.payroll.default_working_days,
        "starting payroll-server"
    );

    let host = ServerHost::from_config(config).await?;
    ServerBuilder::new()
        .with_host(host)
        .serve(&addr.to_string())
        .await
}
