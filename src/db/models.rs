use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::{PermissionLevel, Principal};
use crate::error::AppError;

/// A shared document stored in the `documents` collection.
///
/// Field names are camelCase on the wire (`documentId`, `ownerId`,
/// `sharedWith`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Store-generated identifier, immutable after creation.
    pub document_id: String,
    /// Human-readable title.
    pub title: String,
    /// Rich text serialized as HTML.
    pub content: String,
    /// Creation or last modification time.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// uid of the creating principal.
    pub owner_id: String,
    /// Denormalized owner email.
    #[serde(default)]
    pub owner_email: String,
    /// Principal uid -> permission level. The owner is always present at `edit`.
    #[serde(default)]
    pub shared_with: BTreeMap<String, PermissionLevel>,
}

impl Document {
    /// Build a freshly created document owned by `owner`.
    pub fn new_owned(
        document_id: String,
        title: impl Into<String>,
        content: impl Into<String>,
        owner: &Principal,
    ) -> Self {
        let mut shared_with = BTreeMap::new();
        shared_with.insert(owner.uid.clone(), PermissionLevel::Edit);

        Self {
            document_id,
            title: title.into(),
            content: content.into(),
            timestamp: Utc::now(),
            owner_id: owner.uid.clone(),
            owner_email: owner.email.clone(),
            shared_with,
        }
    }

    /// The permission `uid` holds on this document, if any.
    pub fn permission_for(&self, uid: &str) -> Option<PermissionLevel> {
        self.shared_with.get(uid).copied()
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.owner_id == uid
    }

    /// Verify the structural invariants of a document record.
    pub fn check_invariants(&self) -> Result<(), AppError> {
        if self.document_id.is_empty() {
            return Err(AppError::Internal("Document id cannot be empty".into()));
        }
        if self.owner_id.is_empty() {
            return Err(AppError::Internal(format!(
                "Document '{}' has no owner",
                self.document_id
            )));
        }
        match self.permission_for(&self.owner_id) {
            Some(PermissionLevel::Edit) => Ok(()),
            _ => Err(AppError::Internal(format!(
                "Owner of document '{}' must hold edit permission",
                self.document_id
            ))),
        }
    }
}

/// A user profile in the `users` collection, keyed by uid.
///
/// Written on sign-in and used to resolve an email to a uid when sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<&Principal> for UserProfile {
    fn from(principal: &Principal) -> Self {
        Self {
            uid: principal.uid.clone(),
            email: principal.email.clone(),
            name: principal.display_name.clone(),
        }
    }
}
