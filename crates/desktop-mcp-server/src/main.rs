//! desktop-control-mcp: desktop automation over the Model Context Protocol
//!
//! stdout carries MCP frames, so all logging goes to stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use desktop_core::capture::{MockBackend, composite_from_mock, create_default_backend};
use desktop_mcp_server::{args::ServerArgs, mcp::DesktopMcpServer};
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(json: bool) {
    // RUST_LOG wins over the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("desktop_mcp_server=info,desktop_core=info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    init_logging(args.log_json);

    info!("desktop-control-mcp {} starting...", env!("CARGO_PKG_VERSION"));
    info!("Protocol: Model Context Protocol (MCP)");
    info!("Transport: stdio");

    let config = args.to_config();
    config.validate().context("invalid configuration")?;

    let backend = if args.mock {
        info!("Backend: mock (--mock)");
        Arc::new(composite_from_mock(Arc::new(MockBackend::new())))
    } else {
        let backend = create_default_backend(&config).map_err(|e| {
            let hint = e.remediation_hint().to_string();
            anyhow::Error::new(e).context(hint)
        })?;
        info!("Backend: {} on {}", backend.name, backend.platform.backend);
        backend
    };

    if !config.fail_safe {
        tracing::warn!("Fail-safe disabled: input is not refused in screen corners");
    }
    if !args.mock && !config.ocr.is_configured() {
        info!("OCR models not configured; take_screenshot OCR requests will fail");
    }

    let server = DesktopMcpServer::new(backend, config);
    let service = server.serve(stdio()).await?;

    info!("Server info: {:?}", service.peer_info());
    info!("Waiting for MCP requests...");

    service.waiting().await?;

    info!("desktop-control-mcp shutting down");
    Ok(())
}
