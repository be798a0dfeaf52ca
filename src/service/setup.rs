use std::sync::Arc;

use crate::cache::offline::{OfflineCache, SqliteOfflineCache};
use crate::config::AppConfig;
use crate::db::memory::{MemoryDocumentRepository, MemoryUserDirectory};
use crate::db::repository::DocumentRepository;
use crate::db::user_repository::UserDirectory;
use crate::demo_seeder::seed_demo_data;
use crate::error::AppError;
use crate::service::documents::DocumentService;

/// The stores behind a running client.
#[derive(Clone)]
pub struct Services {
    pub documents: DocumentService,
    pub users: Arc<dyn UserDirectory>,
}

/// Wire the remote stores and the offline cache described by `config`.
///
/// Demo mode uses seeded in-memory stores; otherwise MongoDB is used.
pub async fn connect(config: &AppConfig) -> Result<Services, AppError> {
    let cache: Arc<dyn OfflineCache> = Arc::new(SqliteOfflineCache::open(&config.cache_path)?);
    tracing::debug!("Offline cache at {}", config.cache_path.display());

    let (documents, users) = if config.demo_mode {
        demo_stores().await
    } else {
        remote_stores(config).await?
    };

    Ok(Services {
        documents: DocumentService::new(documents, users.clone(), cache),
        users,
    })
}

async fn demo_stores() -> (Arc<dyn DocumentRepository>, Arc<dyn UserDirectory>) {
    let documents: Arc<dyn DocumentRepository> = Arc::new(MemoryDocumentRepository::new());
    let users: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::new());
    seed_demo_data(documents.as_ref(), users.as_ref()).await;
    tracing::info!("Running in demo mode with in-memory stores");
    (documents, users)
}

#[cfg(feature = "mongo")]
async fn remote_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn DocumentRepository>, Arc<dyn UserDirectory>), AppError> {
    use crate::db::repository::MongoDocumentRepository;
    use crate::db::user_repository::MongoUserDirectory;

    let client = mongodb::Client::with_uri_str(&config.mongodb_uri)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    let db = client.database(&config.mongodb_database);
    tracing::info!("Connected to MongoDB at {}", config.mongodb_uri);

    let documents: Arc<dyn DocumentRepository> = Arc::new(MongoDocumentRepository::new(&db));
    let users: Arc<dyn UserDirectory> = Arc::new(MongoUserDirectory::new(&db));
    Ok((documents, users))
}

#[cfg(not(feature = "mongo"))]
async fn remote_stores(
    _config: &AppConfig,
) -> Result<(Arc<dyn DocumentRepository>, Arc<dyn UserDirectory>), AppError> {
    Err(AppError::Internal(
        "built without the `mongo` feature; enable demo_mode to run".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Principal;
    use crate::demo_seeder::demo_principal;

    #[tokio::test]
    async fn test_demo_mode_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            demo_mode: true,
            cache_path: dir.path().join("offline.db"),
            ..AppConfig::default()
        };

        let services = connect(&config).await.unwrap();
        let docs = services.documents.list_owned(&demo_principal()).await.unwrap();
        assert_eq!(docs.len(), 3);
        assert!(services
            .documents
            .list_owned(&Principal::new("someone-else", "x@y.z"))
            .await
            .unwrap()
            .is_empty());
    }
}
