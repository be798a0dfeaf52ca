use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::models::Principal;
use crate::db::models::UserProfile;
use crate::db::user_repository::UserDirectory;
use crate::error::AppError;

/// Holds the principal of the current session.
///
/// The OAuth flow itself happens outside this crate; the resulting identity is
/// handed to [`complete_sign_in`] and then stored here. Observers can follow
/// sign-in state through [`SessionStore::subscribe`].
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Principal>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A store that starts out signed in, e.g. when a session was restored.
    pub fn signed_in(principal: Principal) -> Self {
        let (tx, _rx) = watch::channel(Some(principal));
        Self { tx: Arc::new(tx) }
    }

    pub fn sign_in(&self, principal: Principal) {
        tracing::info!("Signed in as {}", principal.email);
        self.tx.send_replace(Some(principal));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("Signed out");
        }
    }

    pub fn current(&self) -> Option<Principal> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The current principal, or an `Auth` error when nobody is signed in.
    pub fn require(&self) -> Result<Principal, AppError> {
        self.current()
            .ok_or_else(|| AppError::Auth("Not signed in".into()))
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.tx.subscribe()
    }
}

/// Finish a sign-in: record the user's profile in the directory (so others can
/// share with them by email) and make them the current principal.
pub async fn complete_sign_in(
    session: &SessionStore,
    directory: &dyn UserDirectory,
    principal: Principal,
) -> Result<(), AppError> {
    if principal.uid.trim().is_empty() {
        return Err(AppError::Auth("Identity provider returned no user id".into()));
    }
    if principal.email.trim().is_empty() {
        return Err(AppError::Auth("Identity provider returned no email".into()));
    }

    directory
        .upsert_profile(UserProfile::from(&principal))
        .await?;
    session.sign_in(principal);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::user_repository::MockUserDirectory;

    #[test]
    fn test_require_when_signed_out() {
        let session = SessionStore::new();
        assert!(matches!(session.require(), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_sign_in_and_out_notifies_subscribers() {
        let session = SessionStore::new();
        let mut rx = session.subscribe();

        session.sign_in(Principal::new("uid-1", "a@x.com"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|p| p.uid.as_str()), Some("uid-1"));

        session.sign_out();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_complete_sign_in_stores_profile() {
        let mut directory = MockUserDirectory::new();
        directory
            .expect_upsert_profile()
            .withf(|p| p.uid == "uid-1" && p.email == "a@x.com" && p.name.as_deref() == Some("Alice"))
            .times(1)
            .returning(|_| Ok(()));

        let session = SessionStore::new();
        let principal = Principal::new("uid-1", "a@x.com").with_display_name("Alice");
        complete_sign_in(&session, &directory, principal).await.unwrap();

        assert_eq!(session.require().unwrap().uid, "uid-1");
    }

    #[tokio::test]
    async fn test_complete_sign_in_without_email_fails() {
        let mut directory = MockUserDirectory::new();
        directory.expect_upsert_profile().times(0);

        let session = SessionStore::new();
        let result = complete_sign_in(&session, &directory, Principal::new("uid-1", "")).await;
        assert!(matches!(result, Err(AppError::Auth(_))));
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_directory_failure_leaves_session_signed_out() {
        let mut directory = MockUserDirectory::new();
        directory
            .expect_upsert_profile()
            .returning(|_| Err(AppError::Database("unavailable".into())));

        let session = SessionStore::new();
        let result =
            complete_sign_in(&session, &directory, Principal::new("uid-1", "a@x.com")).await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(!session.is_signed_in());
    }
}
