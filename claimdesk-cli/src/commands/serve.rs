//! HTTP server command
//!
//! Runs the table editor against the configured Supabase project, or against
//! a seeded in-memory backend with `--demo`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use claimdesk_backend::SupabaseClient;
use claimdesk_core::{Backend, DeskConfig, MemoryBackend};
use claimdesk_server::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config; default 127.0.0.1:3000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Mark the session cookie Secure (serve behind HTTPS)
    #[arg(long)]
    pub cookie_secure: bool,

    /// Use an in-memory backend with demo rows (login: demo@example.com / demo)
    #[arg(long)]
    pub demo: bool,
}

/// Run the HTTP server (blocks until shutdown)
pub async fn run_serve(args: ServeArgs, config: &DeskConfig) -> Result<()> {
    let mut server_config = ServerConfig::from(config);
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    if args.cookie_secure {
        server_config.cookie_secure = true;
    }

    let backend: Arc<dyn Backend> = if args.demo {
        tracing::warn!("Demo mode: using in-memory backend, nothing is persisted");
        Arc::new(MemoryBackend::demo().await)
    } else {
        let client = SupabaseClient::from_config(config)
            .context("Backend not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY, or use --demo")?;
        tracing::info!(backend = %client.base_url(), "Using Supabase backend");
        Arc::new(client)
    };

    run_server(backend, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
