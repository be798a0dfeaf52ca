//! In-memory store implementations.
//!
//! Used by demo mode and by tests that exercise the service layer without a
//! running MongoDB.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::models::PermissionLevel;
use crate::db::models::{Document, UserProfile};
use crate::db::repository::{not_found, DocumentRepository};
use crate::db::user_repository::UserDirectory;
use crate::error::AppError;

fn poisoned() -> AppError {
    AppError::Internal("in-memory store lock poisoned".into())
}

#[derive(Default)]
pub struct MemoryDocumentRepository {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn insert(&self, doc: Document) -> Result<(), AppError> {
        let mut docs = self.documents.lock().map_err(|_| poisoned())?;
        if docs.contains_key(&doc.document_id) {
            return Err(AppError::Database(format!(
                "Document '{}' already exists",
                doc.document_id
            )));
        }
        docs.insert(doc.document_id.clone(), doc);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        let docs = self.documents.lock().map_err(|_| poisoned())?;
        Ok(docs.get(id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Document>, AppError> {
        let docs = self.documents.lock().map_err(|_| poisoned())?;
        let mut owned: Vec<Document> = docs
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        Ok(owned)
    }

    async fn update_fields(
        &self,
        id: &str,
        title: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut docs = self.documents.lock().map_err(|_| poisoned())?;
        let doc = docs.get_mut(id).ok_or_else(|| not_found(id))?;
        doc.title = title.to_string();
        doc.content = content.to_string();
        doc.timestamp = timestamp;
        Ok(())
    }

    async fn set_permission(
        &self,
        id: &str,
        uid: &str,
        level: PermissionLevel,
    ) -> Result<(), AppError> {
        let mut docs = self.documents.lock().map_err(|_| poisoned())?;
        let doc = docs.get_mut(id).ok_or_else(|| not_found(id))?;
        doc.shared_with.insert(uid.to_string(), level);
        Ok(())
    }

    async fn revoke_permission(&self, id: &str, uid: &str) -> Result<(), AppError> {
        let mut docs = self.documents.lock().map_err(|_| poisoned())?;
        let doc = docs.get_mut(id).ok_or_else(|| not_found(id))?;
        doc.shared_with.remove(uid);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut docs = self.documents.lock().map_err(|_| poisoned())?;
        docs.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }
}

#[derive(Default)]
pub struct MemoryUserDirectory {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn upsert_profile(&self, profile: UserProfile) -> Result<(), AppError> {
        let mut profiles = self.profiles.lock().map_err(|_| poisoned())?;
        profiles.insert(profile.uid.clone(), profile);
        Ok(())
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        let profiles = self.profiles.lock().map_err(|_| poisoned())?;
        Ok(profiles.get(uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let needle = email.trim().to_lowercase();
        let profiles = self.profiles.lock().map_err(|_| poisoned())?;
        let mut matches: Vec<&UserProfile> = profiles
            .values()
            .filter(|p| p.email.to_lowercase() == needle)
            .collect();
        // HashMap order is arbitrary; keep "first hit" deterministic
        matches.sort_by(|a, b| a.uid.cmp(&b.uid));
        Ok(matches.first().map(|p| (*p).clone()))
    }
}
