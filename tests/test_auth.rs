mod common;

use async_trait::async_trait;
use common::{alice, LocalEnv};
use docshare::auth::models::Principal;
use docshare::auth::session::{complete_sign_in, SessionStore};
use docshare::db::memory::MemoryUserDirectory;
use docshare::db::models::UserProfile;
use docshare::db::user_repository::UserDirectory;
use docshare::error::AppError;
use docshare::state::DocumentViewModel;

#[tokio::test]
async fn sign_in_registers_profile() {
    let directory = MemoryUserDirectory::new();
    let session = SessionStore::new();

    complete_sign_in(
        &session,
        &directory,
        Principal::new("uid-dave", "Dave@X.com").with_display_name("Dave"),
    )
    .await
    .unwrap();

    assert_eq!(session.require().unwrap().uid, "uid-dave");
    let profile = directory.find_by_email("dave@x.com").await.unwrap().unwrap();
    assert_eq!(profile.uid, "uid-dave");
    assert_eq!(profile.name.as_deref(), Some("Dave"));
}

#[tokio::test]
async fn incomplete_identity_is_rejected() {
    let directory = MemoryUserDirectory::new();
    let session = SessionStore::new();

    let err = complete_sign_in(&session, &directory, Principal::new("", "a@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
    assert!(!session.is_signed_in());
    assert!(directory.find_by_email("a@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn sign_out_stops_commands() {
    let env = LocalEnv::start().await;
    let session = env.sign_in(alice()).await;
    let vm = DocumentViewModel::new(env.service.clone(), session.clone());
    vm.create("Notes", "").await.unwrap();

    let mut watcher = session.subscribe();
    session.sign_out();
    assert!(watcher.has_changed().unwrap());
    assert!(watcher.borrow_and_update().is_none());

    let err = vm.refresh().await.unwrap_err();
    assert_eq!(err.to_string(), "Authentication error: Not signed in");
    assert_eq!(
        vm.error().borrow().as_deref(),
        Some("Authentication error: Not signed in")
    );
}

struct UnreachableDirectory;

#[async_trait]
impl UserDirectory for UnreachableDirectory {
    async fn upsert_profile(&self, _profile: UserProfile) -> Result<(), AppError> {
        Err(AppError::Database("connection refused".into()))
    }

    async fn find_by_uid(&self, _uid: &str) -> Result<Option<UserProfile>, AppError> {
        Err(AppError::Database("connection refused".into()))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<UserProfile>, AppError> {
        Err(AppError::Database("connection refused".into()))
    }
}

#[tokio::test]
async fn directory_failure_aborts_sign_in() {
    let session = SessionStore::new();

    let err = complete_sign_in(&session, &UnreachableDirectory, alice())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    assert!(!session.is_signed_in());
}
