use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kaiwa_api::state::AppStateInner;
use kaiwa_db::Database;
use kaiwa_gateway::dispatcher::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "kaiwa_server=debug,kaiwa_api=debug,kaiwa_gateway=debug,kaiwa_db=debug,tower_http=debug"
                .into()
        }))
        .init();

    let jwt_secret = match std::env::var("KAIWA_JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            if cfg!(debug_assertions) {
                warn!("KAIWA_JWT_SECRET not set, falling back to the dev secret");
                "dev-secret-change-me".to_string()
            } else {
                anyhow::bail!("KAIWA_JWT_SECRET must be set");
            }
        }
    };
    let db_path = std::env::var("KAIWA_DB_PATH").unwrap_or_else(|_| "kaiwa.db".to_string());
    let host = std::env::var("KAIWA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("KAIWA_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .context("KAIWA_PORT must be a port number")?;

    let db = Database::open(&PathBuf::from(&db_path))?;
    let dispatcher = Dispatcher::new();

    let state = Arc::new(AppStateInner {
        db: Arc::new(db),
        dispatcher,
        jwt_secret,
    });

    let app = kaiwa_server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("KAIWA_HOST/KAIWA_PORT do not form a socket address")?;
    info!("Kaiwa listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
