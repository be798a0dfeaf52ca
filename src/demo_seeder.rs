use chrono::{Duration, Utc};

use crate::auth::models::{PermissionLevel, Principal};
use crate::db::models::{Document, UserProfile};
use crate::db::repository::DocumentRepository;
use crate::db::user_repository::UserDirectory;

pub const DEMO_OWNER_UID: &str = "demo-alice";
pub const DEMO_OWNER_EMAIL: &str = "alice@example.com";
pub const DEMO_GUEST_UID: &str = "demo-bob";
pub const DEMO_GUEST_EMAIL: &str = "bob@example.com";

/// The principal the CLI acts as in demo mode when none is given.
pub fn demo_principal() -> Principal {
    Principal::new(DEMO_OWNER_UID, DEMO_OWNER_EMAIL).with_display_name("Alice (demo)")
}

fn demo_guest() -> Principal {
    Principal::new(DEMO_GUEST_UID, DEMO_GUEST_EMAIL).with_display_name("Bob (demo)")
}

/// Seed demo users and documents. Documents whose id already exists are left alone.
///
/// Returns the number of documents inserted.
pub async fn seed_demo_data(documents: &dyn DocumentRepository, users: &dyn UserDirectory) -> usize {
    tracing::info!("Starting demo data seeding...");

    let owner = demo_principal();
    let guest = demo_guest();
    for principal in [&owner, &guest] {
        if let Err(e) = users.upsert_profile(UserProfile::from(principal)).await {
            tracing::error!("Failed to register demo user '{}': {}", principal.email, e);
        }
    }

    let now = Utc::now();
    let demo_docs = [
        (
            "welcome",
            "Welcome to DocShare",
            "<h1>Welcome</h1><p>Create documents, share them by email and keep copies for offline reading.</p>",
            None,
            0,
        ),
        (
            "meeting-notes",
            "Weekly meeting notes",
            "<h2>Agenda</h2><ul><li>Release planning</li><li>Offline mode feedback</li></ul>",
            Some(PermissionLevel::Edit),
            1,
        ),
        (
            "reading-list",
            "Reading list",
            "<p>Designing Data-Intensive Applications</p><p>The Rust Programming Language</p>",
            Some(PermissionLevel::View),
            2,
        ),
    ];

    let mut inserted = 0;
    for (id, title, content, guest_level, age_days) in demo_docs {
        match documents.find_by_id(id).await {
            Ok(Some(_)) => {
                tracing::info!("Document '{}' already exists, skipping.", id);
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to check for existing document '{}': {}", id, e);
                continue;
            }
            Ok(None) => {}
        }

        let mut document = Document::new_owned(id.to_string(), title, content, &owner);
        document.timestamp = now - Duration::days(age_days);
        if let Some(level) = guest_level {
            document.shared_with.insert(guest.uid.clone(), level);
        }

        match documents.insert(document).await {
            Ok(()) => {
                tracing::info!("Inserted demo document '{}'.", id);
                inserted += 1;
            }
            Err(e) => tracing::error!("Failed to insert demo document '{}': {}", id, e),
        }
    }

    tracing::info!("Demo data seeding completed.");
    inserted
}
