//! k-anonymity range API over an [`hibp_rangedb`] database.
//!
//! `GET /api/range/{prefix}` answers with the JSON array of every known
//! SHA-1 suffix (34 lower-case hex characters) under the 6-character prefix.
//! The address table is loaded once at startup and shared read-only by all
//! requests; each request costs one positioned read of the matching records.

pub mod error;
pub mod http;

use std::path::PathBuf;
use std::sync::Arc;

use hibp_rangedb::RangeDb;
use tokio::net::TcpListener;
use tracing::{error, info};

pub use error::{ApiError, Error};
pub use http::{PREFIX_ERROR, SharedDb, router};

/// Default listen address, matching the upstream API's local port.
pub const DEFAULT_LISTEN: &str = "localhost:8080";

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Database built by `hibp-range generate`
    pub db_path: PathBuf,
    /// Address to bind, anything `TcpListener::bind` accepts
    pub listen: String,
}

impl ServerConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into(), ..Default::default() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { db_path: PathBuf::from("pwned-passwords.db"), listen: DEFAULT_LISTEN.to_string() }
    }
}

/// Opens the database off the runtime threads; the table load is a 64 MiB read.
pub async fn open_db(config: &ServerConfig) -> Result<SharedDb, Error> {
    let path = config.db_path.clone();
    let db = tokio::task::spawn_blocking(move || RangeDb::open(path)).await??;
    info!(
        "Loaded {:?}: {} hashes across {} prefixes",
        db.path(),
        db.record_count(),
        db.table().prefixes_present()
    );
    Ok(Arc::new(db))
}

/// Loads the database and serves the API until Ctrl+C or SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), Error> {
    let db = open_db(&config).await?;
    let app = router(db);

    let listener = TcpListener::bind(&config.listen)
        .await
        .map_err(|source| Error::Bind { addr: config.listen.clone(), source })?;

    info!("Starting server, listening on {:?}", config.listen);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_db_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::new(dir.path().join("missing.db"));

        let err = open_db(&config).await.unwrap_err();
        assert!(matches!(err, Error::Db(hibp_rangedb::Error::Open { .. })), "{err}");
    }

    #[tokio::test]
    async fn test_run_fails_fast_on_truncated_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.db");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let err = run(ServerConfig::new(&path)).await.unwrap_err();
        assert!(matches!(err, Error::Db(hibp_rangedb::Error::Truncated { len: 64 })), "{err}");
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, "localhost:8080");
    }
}
