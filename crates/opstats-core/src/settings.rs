use clap::Parser;
use std::net::SocketAddr;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// CSV measurement ingest and aggregate statistics service
#[derive(Parser, Debug, Clone)]
#[command(
    name = "opstats",
    about = "CSV measurement ingest and aggregate statistics service",
    version
)]
pub struct Settings {
    /// Socket address to listen on
    #[arg(long, env = "OPSTATS_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// SQLite database URL (created on first run if missing)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:opstats.db?mode=rwc")]
    pub database_url: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}
