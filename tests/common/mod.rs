#![allow(dead_code)]

use std::sync::Arc;

#[cfg(feature = "mongo")]
use testcontainers::{runners::AsyncRunner, ContainerAsync};
#[cfg(feature = "mongo")]
use testcontainers_modules::mongo::Mongo;

use docshare::auth::models::Principal;
use docshare::auth::session::{complete_sign_in, SessionStore};
use docshare::cache::offline::{MemoryOfflineCache, OfflineCache, SqliteOfflineCache};
use docshare::db::memory::{MemoryDocumentRepository, MemoryUserDirectory};
use docshare::db::repository::DocumentRepository;
#[cfg(feature = "mongo")]
use docshare::db::repository::MongoDocumentRepository;
#[cfg(feature = "mongo")]
use docshare::db::user_repository::MongoUserDirectory;
use docshare::db::user_repository::UserDirectory;
use docshare::service::documents::DocumentService;
use docshare::state::DocumentViewModel;

pub fn alice() -> Principal {
    Principal::new("uid-alice", "alice@x.com").with_display_name("Alice")
}

pub fn bob() -> Principal {
    Principal::new("uid-bob", "bob@x.com").with_display_name("Bob")
}

pub fn carol() -> Principal {
    Principal::new("uid-carol", "carol@x.com")
}

/// Stores and a service wired together, without any external process.
pub struct LocalEnv {
    pub repo: Arc<dyn DocumentRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub cache: Arc<dyn OfflineCache>,
    pub service: DocumentService,
}

impl LocalEnv {
    /// In-memory remote stores and an in-memory offline cache.
    pub async fn start() -> Self {
        Self::with_cache(Arc::new(MemoryOfflineCache::new())).await
    }

    /// In-memory remote stores backed by the given offline cache.
    pub async fn with_cache(cache: Arc<dyn OfflineCache>) -> Self {
        let repo: Arc<dyn DocumentRepository> = Arc::new(MemoryDocumentRepository::new());
        let users: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::new());
        let service = DocumentService::new(repo.clone(), users.clone(), cache.clone());
        let env = Self {
            repo,
            users,
            cache,
            service,
        };
        // alice and bob have signed in before, carol never has
        env.sign_in(alice()).await;
        env.sign_in(bob()).await;
        env
    }

    /// Run the sign-in flow for `principal` and return the resulting session.
    pub async fn sign_in(&self, principal: Principal) -> SessionStore {
        let session = SessionStore::new();
        complete_sign_in(&session, self.users.as_ref(), principal)
            .await
            .expect("sign-in should succeed");
        session
    }

    pub async fn view_model_for(&self, principal: Principal) -> DocumentViewModel {
        let session = self.sign_in(principal).await;
        DocumentViewModel::new(self.service.clone(), session)
    }
}

/// Open a SQLite offline cache in a fresh temporary directory.
///
/// The directory is removed when the returned guard is dropped.
pub fn sqlite_cache() -> (tempfile::TempDir, Arc<SqliteOfflineCache>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cache = SqliteOfflineCache::open(dir.path().join("offline.db"))
        .expect("Failed to open SQLite cache");
    (dir, Arc::new(cache))
}

/// Holds a running MongoDB container and repositories pointed at it.
///
/// The container is stopped when this struct is dropped.
#[cfg(feature = "mongo")]
pub struct MongoEnv {
    _mongo: ContainerAsync<Mongo>,
    pub repo: Arc<dyn DocumentRepository>,
    pub users: Arc<dyn UserDirectory>,
}

#[cfg(feature = "mongo")]
impl MongoEnv {
    pub async fn start() -> Self {
        let container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let port = container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let client = mongodb::Client::with_uri_str(format!("mongodb://127.0.0.1:{}", port))
            .await
            .expect("Failed to connect to MongoDB");
        let db = client.database("docshare_test");

        Self {
            _mongo: container,
            repo: Arc::new(MongoDocumentRepository::new(&db)),
            users: Arc::new(MongoUserDirectory::new(&db)),
        }
    }

    pub fn service(&self) -> DocumentService {
        DocumentService::new(
            self.repo.clone(),
            self.users.clone(),
            Arc::new(MemoryOfflineCache::new()),
        )
    }
}
