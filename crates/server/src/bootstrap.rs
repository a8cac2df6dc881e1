use myshop_core::config::{AppConfig, StorageBackend};
use myshop_db::{
    connect_with_config, migrations, CatalogSeedDataset, RepositoryBackend, RepositoryError,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub backend: RepositoryBackend,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("demo catalog load failed: {0}")]
    Seed(#[source] RepositoryError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        storage_backend = ?config.storage.backend,
        "starting application bootstrap"
    );

    let backend = match config.storage.backend {
        StorageBackend::Sql => {
            let pool = connect_with_config(&config.database)
                .await
                .map_err(BootstrapError::DatabaseConnect)?;
            info!(
                event_name = "system.bootstrap.database_connected",
                correlation_id = "bootstrap",
                "database connection established"
            );

            migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
            info!(
                event_name = "system.bootstrap.migrations_applied",
                correlation_id = "bootstrap",
                "database migrations applied"
            );
            RepositoryBackend::Sql(pool)
        }
        StorageBackend::Memory => {
            // The in-memory store starts empty on every boot.
            let backend = RepositoryBackend::in_memory();
            let seeded = CatalogSeedDataset::load(&backend).await.map_err(BootstrapError::Seed)?;
            info!(
                event_name = "system.bootstrap.memory_seeded",
                correlation_id = "bootstrap",
                categories = seeded.categories_inserted,
                products = seeded.products_inserted,
                "in-memory store seeded with demo catalog"
            );
            backend
        }
    };

    Ok(Application { config, backend })
}
