use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::models::PermissionLevel;
use crate::db::models::Document;
use crate::error::AppError;

/// Repository trait for remote document operations.
///
/// This trait allows swapping the remote store for an in-memory one in tests
/// and demo mode.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Generate a fresh document id, the way the remote store would.
    fn allocate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Store a newly created document.
    async fn insert(&self, doc: Document) -> Result<(), AppError>;

    /// Find a document by its id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError>;

    /// List all documents owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Document>, AppError>;

    /// Replace title and content and set the modification time.
    ///
    /// Returns `NotFound` when no document has the given id.
    async fn update_fields(
        &self,
        id: &str,
        title: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Add or change a single `sharedWith` entry, leaving the others untouched.
    async fn set_permission(
        &self,
        id: &str,
        uid: &str,
        level: PermissionLevel,
    ) -> Result<(), AppError>;

    /// Remove a single `sharedWith` entry.
    async fn revoke_permission(&self, id: &str, uid: &str) -> Result<(), AppError>;

    /// Delete a document. Returns `NotFound` when no document has the given id.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

pub(crate) fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Document '{}' does not exist", id))
}

/// MongoDB implementation of the DocumentRepository.
///
/// Only available when the `mongo` feature is enabled.
#[cfg(feature = "mongo")]
pub struct MongoDocumentRepository {
    collection: mongodb::Collection<Document>,
}

#[cfg(feature = "mongo")]
impl MongoDocumentRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("documents"),
        }
    }
}

/// Map keys become dotted field paths, so they must not contain `.` or start with `$`.
#[cfg(feature = "mongo")]
fn shared_with_path(uid: &str) -> Result<String, AppError> {
    if uid.is_empty() || uid.contains('.') || uid.starts_with('$') {
        return Err(AppError::BadRequest(format!(
            "'{}' is not a valid principal id",
            uid
        )));
    }
    Ok(format!("sharedWith.{}", uid))
}

#[cfg(feature = "mongo")]
#[async_trait]
impl DocumentRepository for MongoDocumentRepository {
    async fn insert(&self, doc: Document) -> Result<(), AppError> {
        self.collection
            .insert_one(&doc)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "documentId": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Document>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1, "documentId": 1 })
            .build();

        let cursor = self
            .collection
            .find(doc! { "ownerId": owner_id })
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_fields(
        &self,
        id: &str,
        title: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .update_one(
                doc! { "documentId": id },
                doc! { "$set": {
                    "title": title,
                    "content": content,
                    "timestamp": timestamp.timestamp_millis(),
                } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn set_permission(
        &self,
        id: &str,
        uid: &str,
        level: PermissionLevel,
    ) -> Result<(), AppError> {
        use mongodb::bson::{doc, Document as BsonDocument};

        let mut entry = BsonDocument::new();
        entry.insert(shared_with_path(uid)?, level.as_str());

        let result = self
            .collection
            .update_one(doc! { "documentId": id }, doc! { "$set": entry })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn revoke_permission(&self, id: &str, uid: &str) -> Result<(), AppError> {
        use mongodb::bson::{doc, Document as BsonDocument};

        let mut entry = BsonDocument::new();
        entry.insert(shared_with_path(uid)?, "");

        let result = self
            .collection
            .update_one(doc! { "documentId": id }, doc! { "$unset": entry })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .delete_one(doc! { "documentId": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.deleted_count == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
