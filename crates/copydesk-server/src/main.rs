//! copydesk-server binary
//!
//! Serves the Copydesk chat UI and relays its conversations to the
//! completion API. Secrets come from `CHAT_PASSWORD` and `OPENAI_API_KEY`.

use anyhow::Result;
use clap::Parser;
use copydesk_core::{PromptTemplate, RelayConfig};
use copydesk_server::{shutdown_signal, CopydeskServer, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "copydesk-server")]
#[command(about = "Copywriting assistant relay and chat UI")]
#[command(version)]
struct Args {
    /// Server bind address
    #[arg(short, long, env = "COPYDESK_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// System prompt template (defaults to prompts/system/main.md, then the built-in prompt)
    #[arg(long, env = "COPYDESK_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Upstream model name
    #[arg(long, env = "COPYDESK_MODEL")]
    model: Option<String>,

    /// Upstream OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "60")]
    upstream_timeout: u64,

    /// Maximum request body size in bytes
    #[arg(long, default_value = "10485760")] // 10MB
    max_body_size: usize,

    /// Enable CORS
    #[arg(long, default_value = "false")]
    cors: bool,

    /// CORS allowed origins (comma-separated)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let bind_addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", args.bind, e))?;

    let mut relay_config =
        RelayConfig::from_env().with_upstream_timeout(Duration::from_secs(args.upstream_timeout));
    if let Some(model) = args.model {
        relay_config = relay_config.with_model(model);
    }
    if let Some(api_base) = args.api_base {
        relay_config = relay_config.with_api_base(api_base);
    }

    let base_dir = std::env::current_dir()?;
    let prompt = PromptTemplate::resolve(args.prompt_file.as_deref(), &base_dir).await?;

    let mut server_config = ServerConfig::new()
        .with_bind_addr(bind_addr)
        .with_cors(args.cors)
        .with_max_body_size(args.max_body_size)
        .with_logging(true);
    if let Some(origins) = args.cors_origins {
        server_config =
            server_config.with_cors_origins(origins.split(',').map(|s| s.trim().to_string()).collect());
    }

    log::info!("Configuration:");
    log::info!("  Bind address: {}", bind_addr);
    log::info!("  Model: {}", relay_config.model);
    log::info!("  API base: {}", relay_config.api_base);
    log::info!("  Prompt: {:?}", prompt.source());
    log::info!("  Upstream timeout: {}s", args.upstream_timeout);
    log::info!("  Max body size: {} bytes", args.max_body_size);
    log::info!("  CORS enabled: {}", args.cors);

    let server = CopydeskServer::from_relay_config(&relay_config, prompt, server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
