use async_trait::async_trait;

use crate::db::models::UserProfile;
use crate::error::AppError;

/// Repository trait for the user directory.
///
/// Sharing resolves an email to a uid through this directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create or replace the profile stored under `profile.uid`.
    async fn upsert_profile(&self, profile: UserProfile) -> Result<(), AppError>;

    /// Find a profile by uid.
    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserProfile>, AppError>;

    /// Find the first profile whose email matches (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError>;
}

/// MongoDB implementation of the UserDirectory.
#[cfg(feature = "mongo")]
pub struct MongoUserDirectory {
    collection: mongodb::Collection<UserProfile>,
}

#[cfg(feature = "mongo")]
impl MongoUserDirectory {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

#[cfg(feature = "mongo")]
#[async_trait]
impl UserDirectory for MongoUserDirectory {
    async fn upsert_profile(&self, profile: UserProfile) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::ReplaceOptions;

        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(doc! { "uid": &profile.uid }, &profile)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "uid": uid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::{Collation, CollationStrength, FindOneOptions};

        // Strength 2 compares case-insensitively
        let collation = Collation::builder()
            .locale("en".to_string())
            .strength(CollationStrength::Secondary)
            .build();
        let options = FindOneOptions::builder().collation(collation).build();

        self.collection
            .find_one(doc! { "email": email.trim() })
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
