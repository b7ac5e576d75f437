//! Reusable server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init, migrations, REST API and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{SharedSubscriptionService, SubscriptionService};
use crate::config::AppConfig;
use crate::domain::SubscriptionRepository;
use crate::infrastructure::database::migrator::Migrator;
use crate::support::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::{create_api_router, init_database, DatabaseConfig, SeaOrmSubscriptionRepository};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the server.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server.
///
/// # Examples
///
/// ```rust,no_run
/// use subscription_aggregator::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Subscription service backing the REST API.
    pub service: SharedSubscriptionService,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the API is actually bound to.
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the server with the given options.
    ///
    /// Connects to the database, runs migrations (if enabled), then binds
    /// the REST API (with Swagger UI) and serves it in a background task.
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;

        info!("🚀 Starting subscription aggregator...");

        // ── Database ───────────────────────────────────────────
        let db_config = DatabaseConfig {
            url: app_cfg.database.connection_url(),
            pool: app_cfg.database.pool.clone(),
        };
        let db = init_database(&db_config).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("✅ Migrations completed");
        }

        // ── Repositories & Services ────────────────────────────
        let repo: Arc<dyn SubscriptionRepository> =
            Arc::new(SeaOrmSubscriptionRepository::new(db.clone()));
        let service: SharedSubscriptionService = Arc::new(SubscriptionService::new(repo));

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(service.clone());

        let api_addr = app_cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            service,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    ///
    /// In-flight requests drain first; closing the pool is bounded by the
    /// configured shutdown timeout.
    pub async fn wait(self) {
        info!("Waiting for server tasks to complete...");

        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }

        let db = self.db;
        self.shutdown
            .run_cleanup(async move {
                if let Err(e) = db.close().await {
                    warn!("Error closing database connection: {}", e);
                } else {
                    info!("✅ Database connection closed");
                }
            })
            .await;

        info!("✅ Shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down subscription aggregator...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG`, when set, wins over `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::CreateSubscriptionRequest;

    fn sqlite_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.database.url = Some("sqlite::memory:".into());
        config.database.pool.max_connections = 1;
        config.database.pool.min_connections = 1;
        config
    }

    #[tokio::test]
    async fn starts_serves_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: sqlite_config(),
            auto_migrate: true,
        })
        .await
        .unwrap();

        assert!(handle.is_running());
        assert_ne!(handle.local_addr.port(), 0);

        let created = handle
            .service
            .create_subscription(CreateSubscriptionRequest {
                service_name: "Netflix".into(),
                price: 299,
                user_id: uuid::Uuid::new_v4(),
                start_date: "01-2024".parse().unwrap(),
                end_date: None,
            })
            .await
            .unwrap();
        assert_eq!(
            handle.service.get_subscription(created.id).await.unwrap(),
            created
        );

        let signal = handle.shutdown_signal();
        handle.shutdown().await;
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn unreachable_database_fails_start() {
        let mut config = sqlite_config();
        config.database.url = Some("sqlite:///nonexistent-dir/for/sure/db.sqlite".into());
        assert!(ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
        })
        .await
        .is_err());
    }
}
