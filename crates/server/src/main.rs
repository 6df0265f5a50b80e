//! sheetview server entry point.
//!
//! Boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use sheetview_client::{FetchConfig, HttpFetcher, Pipeline};
use sheetview_core::CacheDb;
use sheetview_core::config::AppConfig;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db_path = %config.db_path.display(), "Starting sheetview server on stdio transport");

    let cache = CacheDb::open(&config.db_path).await?;
    let fetcher = HttpFetcher::new(FetchConfig::from(&config))?;
    let pipeline = Pipeline::new(Arc::new(cache.clone()), Arc::new(fetcher)).with_default_expire(config.default_expire());

    let handler = handler::SheetviewServer::new(Arc::new(pipeline), cache);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
