use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::models::Principal;
use crate::auth::session::SessionStore;
use crate::cache::models::OfflineDocument;
use crate::db::models::Document;
use crate::error::AppError;
use crate::search::filter::SearchHit;
use crate::service::documents::{DocumentService, OpenedDocument};

struct ViewState {
    documents: watch::Sender<Vec<Document>>,
    current_document: watch::Sender<Option<OpenedDocument>>,
    offline_status: watch::Sender<HashMap<String, bool>>,
    search_results: watch::Sender<Vec<SearchHit>>,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    success: watch::Sender<Option<String>>,
    in_flight: AtomicUsize,
}

impl ViewState {
    fn new() -> Self {
        Self {
            documents: watch::channel(Vec::new()).0,
            current_document: watch::channel(None).0,
            offline_status: watch::channel(HashMap::new()).0,
            search_results: watch::channel(Vec::new()).0,
            loading: watch::channel(false).0,
            error: watch::channel(None).0,
            success: watch::channel(None).0,
            in_flight: AtomicUsize::new(0),
        }
    }
}

/// Observable state for a document UI.
///
/// Each command runs exactly once and either updates the relevant fields or
/// posts a message to `error`. `loading` stays on while any command is in
/// flight. Commands are independent; when two overlap the last one to finish
/// wins.
#[derive(Clone)]
pub struct DocumentViewModel {
    service: DocumentService,
    session: SessionStore,
    state: Arc<ViewState>,
}

impl DocumentViewModel {
    pub fn new(service: DocumentService, session: SessionStore) -> Self {
        Self {
            service,
            session,
            state: Arc::new(ViewState::new()),
        }
    }

    pub fn documents(&self) -> watch::Receiver<Vec<Document>> {
        self.state.documents.subscribe()
    }

    pub fn current_document(&self) -> watch::Receiver<Option<OpenedDocument>> {
        self.state.current_document.subscribe()
    }

    pub fn offline_status(&self) -> watch::Receiver<HashMap<String, bool>> {
        self.state.offline_status.subscribe()
    }

    pub fn search_results(&self) -> watch::Receiver<Vec<SearchHit>> {
        self.state.search_results.subscribe()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.state.loading.subscribe()
    }

    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.state.error.subscribe()
    }

    pub fn success(&self) -> watch::Receiver<Option<String>> {
        self.state.success.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.error.send_replace(None);
    }

    pub fn clear_success(&self) {
        self.state.success.send_replace(None);
    }

    /// Reload the caller's documents and their offline flags.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.run(async {
            let principal = self.session.require()?;
            let docs = self.service.list_owned(&principal).await?;
            self.publish_documents(docs).await;
            Ok(())
        })
        .await
    }

    pub async fn open(&self, id: &str) -> Result<OpenedDocument, AppError> {
        self.run(async {
            let principal = self.session.require()?;
            let opened = self.service.open(&principal, id).await?;
            self.state
                .current_document
                .send_replace(Some(opened.clone()));
            Ok(opened)
        })
        .await
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<Document, AppError> {
        self.run(async {
            let principal = self.session.require()?;
            let doc = self.service.create(&principal, title, content).await?;
            self.reload(&principal).await?;
            self.post_success("Document created");
            Ok(doc)
        })
        .await
    }

    pub async fn update(&self, id: &str, title: &str, content: &str) -> Result<Document, AppError> {
        self.run(async {
            let principal = self.session.require()?;
            let doc = self.service.update(&principal, id, title, content).await?;
            self.replace_current(&doc);
            self.reload(&principal).await?;
            self.post_success("Document updated");
            Ok(doc)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.run(async {
            let principal = self.session.require()?;
            let remaining = self.service.delete(&principal, id).await?;
            self.state.current_document.send_if_modified(|current| {
                if current.as_ref().is_some_and(|c| c.document.document_id == id) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
            self.publish_documents(remaining).await;
            self.post_success("Document deleted");
            Ok(())
        })
        .await
    }

    pub async fn share(&self, id: &str, email: &str, level: &str) -> Result<Document, AppError> {
        self.run(async {
            let principal = self.session.require()?;
            let doc = self.service.share(&principal, id, email, level).await?;
            self.replace_current(&doc);
            self.post_success("Document shared successfully");
            Ok(doc)
        })
        .await
    }

    /// Save a local copy. The document on screen is used as-is; anything else
    /// is fetched first.
    pub async fn save_offline(&self, id: &str) -> Result<OfflineDocument, AppError> {
        self.run(async {
            let on_screen = self
                .state
                .current_document
                .borrow()
                .as_ref()
                .filter(|c| c.document.document_id == id)
                .map(|c| c.document.clone());

            let entry = match on_screen {
                Some(doc) => self.service.save_offline_copy(&doc).await?,
                None => {
                    let principal = self.session.require()?;
                    self.service.save_offline(&principal, id).await?
                }
            };
            self.set_offline_flag(id, true);
            self.post_success("Document saved offline");
            Ok(entry)
        })
        .await
    }

    pub async fn remove_offline(&self, id: &str) -> Result<bool, AppError> {
        self.run(async {
            let removed = self.service.remove_offline(id).await?;
            self.set_offline_flag(id, false);
            if removed {
                self.post_success("Offline copy removed");
            }
            Ok(removed)
        })
        .await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError> {
        self.run(async {
            let principal = self.session.require()?;
            let hits = self.service.search(&principal, query).await?;
            self.state.search_results.send_replace(hits.clone());
            Ok(hits)
        })
        .await
    }

    async fn run<T, F>(&self, command: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        if self.state.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.state.loading.send_replace(true);
        }
        let result = command.await;
        if self.state.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.loading.send_replace(false);
        }

        if let Err(e) = &result {
            tracing::debug!("Command failed: {e}");
            self.state.error.send_replace(Some(e.to_string()));
        }
        result
    }

    async fn reload(&self, principal: &Principal) -> Result<(), AppError> {
        let docs = self.service.list_owned(principal).await?;
        self.publish_documents(docs).await;
        Ok(())
    }

    /// A cache failure here only loses the offline flags; the listing itself
    /// still comes from the remote store.
    async fn publish_documents(&self, docs: Vec<Document>) {
        match self.service.offline_status(&docs).await {
            Ok(status) => {
                self.state.offline_status.send_replace(status);
            }
            Err(e) => tracing::warn!("Failed to read offline status: {e}"),
        }
        self.state.documents.send_replace(docs);
    }

    fn replace_current(&self, doc: &Document) {
        self.state.current_document.send_if_modified(|current| match current {
            Some(c) if c.document.document_id == doc.document_id => {
                c.document = doc.clone();
                true
            }
            _ => false,
        });
    }

    fn set_offline_flag(&self, id: &str, cached: bool) {
        self.state.offline_status.send_modify(|status| {
            status.insert(id.to_string(), cached);
        });
    }

    fn post_success(&self, message: &str) {
        self.state.success.send_replace(Some(message.to_string()));
    }
}
