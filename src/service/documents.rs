use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::auth::models::{PermissionLevel, Principal};
use crate::cache::models::OfflineDocument;
use crate::cache::offline::OfflineCache;
use crate::db::models::Document;
use crate::db::repository::DocumentRepository;
use crate::db::user_repository::UserDirectory;
use crate::error::AppError;
use crate::rendering::content::sanitize_html;
use crate::search::filter::{build_search_hit, filter_documents, SearchHit};

/// A document together with the permission the caller holds on it.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedDocument {
    pub document: Document,
    pub permission: PermissionLevel,
}

impl OpenedDocument {
    pub fn can_edit(&self) -> bool {
        self.permission.has_access(PermissionLevel::Edit)
    }
}

/// Facade over the remote document store, the user directory and the offline
/// cache.
///
/// The remote store is authoritative: a successful [`open`](Self::open)
/// refreshes an existing offline copy, and the cache is never written back.
/// Every operation runs once; failures are returned to the caller untouched.
#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    users: Arc<dyn UserDirectory>,
    cache: Arc<dyn OfflineCache>,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        users: Arc<dyn UserDirectory>,
        cache: Arc<dyn OfflineCache>,
    ) -> Self {
        Self {
            documents,
            users,
            cache,
        }
    }

    /// All documents owned by `principal`, newest first.
    pub async fn list_owned(&self, principal: &Principal) -> Result<Vec<Document>, AppError> {
        let docs = self.documents.list_by_owner(&principal.uid).await?;
        tracing::debug!("Loaded {} documents for {}", docs.len(), principal.uid);
        Ok(docs)
    }

    /// Fetch a document, checking that `principal` appears in its `sharedWith` map.
    pub async fn open(&self, principal: &Principal, id: &str) -> Result<OpenedDocument, AppError> {
        let document = self.load(id).await?;
        let permission = authorize(&document, principal, PermissionLevel::View)?;

        match self.cache.contains(id).await {
            Ok(true) => {
                if let Err(e) = self.cache.save(OfflineDocument::from(&document)).await {
                    tracing::warn!("Failed to refresh offline copy of '{}': {e}", id);
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Failed to check offline copy of '{}': {e}", id),
        }

        Ok(OpenedDocument {
            document,
            permission,
        })
    }

    /// Create a document owned by `principal`, who gets `edit` permission.
    pub async fn create(
        &self,
        principal: &Principal,
        title: &str,
        content: &str,
    ) -> Result<Document, AppError> {
        let id = self.documents.allocate_id();
        let document = Document::new_owned(id, title, sanitize_html(content), principal);
        document.check_invariants()?;

        self.documents.insert(document.clone()).await?;
        tracing::info!("Created document '{}' for {}", document.document_id, principal.uid);

        Ok(document)
    }

    /// Replace title and content. Requires `edit` permission.
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<Document, AppError> {
        let current = self.load(id).await?;
        authorize(&current, principal, PermissionLevel::Edit)?;

        self.documents
            .update_fields(id, title, &sanitize_html(content), Utc::now())
            .await?;
        tracing::info!("Updated document '{}'", id);

        self.load(id).await
    }

    /// Delete a document and its offline copy. Only the owner may delete.
    ///
    /// Returns the owner's refreshed document list.
    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<Vec<Document>, AppError> {
        let current = self.load(id).await?;
        if !current.is_owned_by(&principal.uid) {
            return Err(AppError::AccessDenied(format!(
                "only the owner can delete document '{}'",
                id
            )));
        }

        self.documents.delete(id).await?;
        tracing::info!("Deleted document '{}'", id);

        if let Err(e) = self.cache.remove(id).await {
            tracing::warn!("Failed to remove offline copy of deleted document '{}': {e}", id);
        }

        self.list_owned(principal).await
    }

    /// Grant `level` on a document to the user registered under `email`.
    ///
    /// The level is validated before anything is read or written.
    pub async fn share(
        &self,
        principal: &Principal,
        id: &str,
        email: &str,
        level: &str,
    ) -> Result<Document, AppError> {
        let level = PermissionLevel::from_str_ci(level)
            .ok_or_else(|| AppError::InvalidPermission(level.to_string()))?;

        let current = self.load(id).await?;
        authorize(&current, principal, PermissionLevel::Edit)?;

        let target = self.resolve_email(email).await?;
        if current.is_owned_by(&target) {
            return Err(AppError::BadRequest(
                "The owner's permission cannot be changed".into(),
            ));
        }

        self.documents.set_permission(id, &target, level).await?;
        tracing::info!("Shared document '{}' with {} as {}", id, target, level);

        self.load(id).await
    }

    /// Remove the permission entry of the user registered under `email`.
    pub async fn revoke(
        &self,
        principal: &Principal,
        id: &str,
        email: &str,
    ) -> Result<Document, AppError> {
        let current = self.load(id).await?;
        authorize(&current, principal, PermissionLevel::Edit)?;

        let target = self.resolve_email(email).await?;
        if current.is_owned_by(&target) {
            return Err(AppError::BadRequest(
                "The owner's permission cannot be changed".into(),
            ));
        }
        if current.permission_for(&target).is_none() {
            return Err(AppError::NotFound(format!(
                "Document '{}' is not shared with {}",
                id, email
            )));
        }

        self.documents.revoke_permission(id, &target).await?;
        tracing::info!("Revoked access to document '{}' for {}", id, target);

        self.load(id).await
    }

    /// Fetch a document the caller can open and store a local copy of it.
    pub async fn save_offline(
        &self,
        principal: &Principal,
        id: &str,
    ) -> Result<OfflineDocument, AppError> {
        let opened = self.open(principal, id).await?;
        self.save_offline_copy(&opened.document).await
    }

    /// Store a local copy of a document already on screen.
    pub async fn save_offline_copy(&self, document: &Document) -> Result<OfflineDocument, AppError> {
        let entry = OfflineDocument::from(document);
        self.cache.save(entry.clone()).await?;
        tracing::info!("Saved document '{}' offline", document.document_id);
        Ok(entry)
    }

    /// Drop the local copy. Returns `false` if there was none.
    pub async fn remove_offline(&self, id: &str) -> Result<bool, AppError> {
        let removed = self.cache.remove(id).await?;
        if removed {
            tracing::info!("Removed offline copy of document '{}'", id);
        }
        Ok(removed)
    }

    pub async fn is_offline(&self, id: &str) -> Result<bool, AppError> {
        self.cache.contains(id).await
    }

    /// The local copy of a document, or `NotFound` if it was never saved.
    pub async fn offline_copy(&self, id: &str) -> Result<OfflineDocument, AppError> {
        self.cache.get(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Document '{}' is not saved offline", id))
        })
    }

    pub async fn list_offline(&self) -> Result<Vec<OfflineDocument>, AppError> {
        self.cache.list_all().await
    }

    /// Whether each listed document has a local copy, keyed by document id.
    pub async fn offline_status(
        &self,
        docs: &[Document],
    ) -> Result<HashMap<String, bool>, AppError> {
        let mut status = HashMap::with_capacity(docs.len());
        for doc in docs {
            let cached = self.cache.contains(&doc.document_id).await?;
            status.insert(doc.document_id.clone(), cached);
        }
        Ok(status)
    }

    /// Search the caller's own documents by title and content.
    pub async fn search(
        &self,
        principal: &Principal,
        query: &str,
    ) -> Result<Vec<SearchHit>, AppError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let docs = self.list_owned(principal).await?;
        Ok(filter_documents(&docs, query)
            .into_iter()
            .map(build_search_hit)
            .collect())
    }

    async fn load(&self, id: &str) -> Result<Document, AppError> {
        self.documents
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document does not exist".into()))
    }

    async fn resolve_email(&self, email: &str) -> Result<String, AppError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::BadRequest("Email cannot be empty".into()));
        }
        self.users
            .find_by_email(email)
            .await?
            .map(|profile| profile.uid)
            .ok_or_else(|| AppError::NotFound("User with this email does not exist".into()))
    }
}

/// Check that `principal` holds at least `required` on `document`.
fn authorize(
    document: &Document,
    principal: &Principal,
    required: PermissionLevel,
) -> Result<PermissionLevel, AppError> {
    match document.permission_for(&principal.uid) {
        Some(level) if level.has_access(required) => Ok(level),
        Some(level) => Err(AppError::AccessDenied(format!(
            "{} permission on document '{}' does not allow {}",
            level, document.document_id, required
        ))),
        None => Err(AppError::AccessDenied(format!(
            "document '{}' is not shared with you",
            document.document_id
        ))),
    }
}
