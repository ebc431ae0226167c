//! Tablesync session server.
//!
//! Serves the HTTP API and the realtime gateway at `/realtime`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tablesync-server
//! cargo run --bin tablesync-server -- --host 0.0.0.0 --port 3000 --jwt-secret s3cr3t
//! ```

use clap::Parser;
use tablesync_server::{
    bootstrap::{AppConfig, build_state},
    ui::Server,
};
use tablesync_shared::logger::setup_logger;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Parser, Debug)]
#[command(name = "tablesync-server")]
#[command(about = "Realtime session server for collaborative tabletop RPG play", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, env = "TABLESYNC_JWT_SECRET", default_value = DEV_JWT_SECRET)]
    jwt_secret: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    if args.jwt_secret == DEV_JWT_SECRET {
        tracing::warn!("Using the development JWT secret; set TABLESYNC_JWT_SECRET in production");
    }

    let config = AppConfig::new(args.jwt_secret);
    let server = Server::new(build_state(&config));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
