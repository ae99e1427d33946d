//! Cached CRUD access to one resource collection.
//!
//! Reads are gated on the session: without a token they resolve to "no data"
//! and never reach the network. Mutations keep the cache coherent for their
//! own resource type only.

use std::{fmt, marker::PhantomData};

use models::{
    client::Client,
    envelope::Page,
    expense::Expense,
    income::Income,
    project::Project,
    resource::{DocumentId, Resource},
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    api_client::{ApiClient, ApiError},
    cache::{CacheKey, CacheSubscription, QueryCache},
    confirmation::{ConfirmationError, ConfirmationOptions, ConfirmationService},
};

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Lifetime of a mounted view. Dropping it marks every [`ScopeHandle`] as
/// unmounted so late responses get discarded.
#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            token: self.token.clone(),
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[derive(Debug, Clone)]
pub struct ScopeHandle {
    token: CancellationToken,
}

impl ScopeHandle {
    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Resolves once the owning view is gone.
    pub async fn unmounted(&self) {
        self.token.cancelled().await
    }
}

/// Outcome of a scoped read.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Ready(T),
    /// No session token, the query never ran
    Disabled,
    /// The view went away before the response arrived
    Discarded,
}

impl<T> Fetched<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

pub type ClientService = ResourceService<Client>;
pub type ProjectService = ResourceService<Project>;
pub type IncomeService = ResourceService<Income>;
pub type ExpenseService = ResourceService<Expense>;

pub struct ResourceService<R> {
    api: ApiClient,
    cache: QueryCache,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for ResourceService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceService")
            .field("resource", &R::KIND)
            .finish()
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            _resource: PhantomData,
        }
    }

    /// Queries only run while a session token exists.
    pub fn is_enabled(&self) -> bool {
        self.api.session().is_authenticated()
    }

    /// One page in server order, served from cache while fresh.
    pub async fn list(&self, page: u32, page_size: u32) -> Result<Option<Page<R>>, ApiError> {
        self.read_list(None, page, page_size, false)
            .await
            .map(Fetched::ready)
    }

    /// Like [`list`](Self::list) but drops the response if `scope` unmounts first.
    pub async fn list_in(
        &self,
        scope: &ScopeHandle,
        page: u32,
        page_size: u32,
    ) -> Result<Fetched<Page<R>>, ApiError> {
        self.read_list(Some(scope), page, page_size, false).await
    }

    /// Fetch a page even when a fresh copy is cached.
    pub async fn refetch_list(&self, page: u32, page_size: u32) -> Result<Option<Page<R>>, ApiError> {
        self.read_list(None, page, page_size, true)
            .await
            .map(Fetched::ready)
    }

    pub async fn get(&self, document_id: &DocumentId) -> Result<Option<R>, ApiError> {
        self.read_item(None, document_id, false)
            .await
            .map(Fetched::ready)
    }

    pub async fn get_in(
        &self,
        scope: &ScopeHandle,
        document_id: &DocumentId,
    ) -> Result<Fetched<R>, ApiError> {
        self.read_item(Some(scope), document_id, false).await
    }

    pub async fn refetch(&self, document_id: &DocumentId) -> Result<Option<R>, ApiError> {
        self.read_item(None, document_id, true)
            .await
            .map(Fetched::ready)
    }

    /// Create a record. Every cached page is marked stale; only the page the
    /// previous total lands on gets the server's copy appended.
    pub async fn create(&self, draft: &R::Draft) -> Result<R, ApiError> {
        let record = self.api.create::<R>(draft).await?;

        self.cache
            .patch_lists::<Page<R>, _>(R::KIND, |page| page.appended(record.clone()))
            .await;
        self.cache
            .insert(self.item_key(record.document_id()), record.clone())
            .await;

        info!(
            resource = %R::KIND,
            document_id = %record.document_id(),
            "Record created"
        );
        Ok(record)
    }

    pub async fn update(&self, document_id: &DocumentId, draft: &R::Draft) -> Result<R, ApiError> {
        let record = self.api.update::<R>(document_id, draft).await?;

        self.cache
            .insert(self.item_key(document_id), record.clone())
            .await;
        self.cache.invalidate_resource(R::KIND).await;

        info!(resource = %R::KIND, document_id = %document_id, "Record updated");
        Ok(record)
    }

    pub async fn delete(&self, document_id: &DocumentId) -> Result<DocumentId, ApiError> {
        let deleted = self.api.delete::<R>(document_id).await?;

        self.cache.remove_item(R::KIND, &deleted).await;
        self.cache.invalidate_resource(R::KIND).await;

        info!(resource = %R::KIND, document_id = %deleted, "Record deleted");
        Ok(deleted)
    }

    /// Ask for confirmation, then delete. `Ok(None)` when the user declines.
    pub async fn delete_confirmed(
        &self,
        confirmations: &ConfirmationService,
        document_id: &DocumentId,
    ) -> Result<Option<DocumentId>, DeleteError> {
        let confirmed = confirmations
            .show_confirmation(ConfirmationOptions::delete(R::KIND))
            .await?;
        if !confirmed {
            info!(resource = %R::KIND, document_id = %document_id, "Deletion declined");
            return Ok(None);
        }
        Ok(Some(self.delete(document_id).await?))
    }

    pub fn subscribe_list(&self, page: u32, page_size: u32) -> CacheSubscription {
        self.cache.subscribe(CacheKey::list(R::KIND, page, page_size))
    }

    pub fn subscribe(&self, document_id: &DocumentId) -> CacheSubscription {
        self.cache.subscribe(self.item_key(document_id))
    }

    async fn read_list(
        &self,
        scope: Option<&ScopeHandle>,
        page: u32,
        page_size: u32,
        force: bool,
    ) -> Result<Fetched<Page<R>>, ApiError> {
        if !self.is_enabled() {
            debug!(resource = %R::KIND, "No session token, list query disabled");
            return Ok(Fetched::Disabled);
        }

        let key = CacheKey::list(R::KIND, page, page_size);
        if !force {
            if let Some(cached) = self.cache.get_fresh::<Page<R>>(&key).await {
                return Ok(Fetched::Ready((*cached).clone()));
            }
        }

        let fetched = self.api.list::<R>(page, page_size).await?;
        if scope.is_some_and(|s| !s.is_mounted()) {
            debug!(resource = %R::KIND, key = %key, "View unmounted, discarding list response");
            return Ok(Fetched::Discarded);
        }

        self.cache.insert(key, fetched.clone()).await;
        Ok(Fetched::Ready(fetched))
    }

    async fn read_item(
        &self,
        scope: Option<&ScopeHandle>,
        document_id: &DocumentId,
        force: bool,
    ) -> Result<Fetched<R>, ApiError> {
        if !self.is_enabled() {
            debug!(resource = %R::KIND, "No session token, item query disabled");
            return Ok(Fetched::Disabled);
        }

        let key = self.item_key(document_id);
        if !force {
            if let Some(cached) = self.cache.get_fresh::<R>(&key).await {
                return Ok(Fetched::Ready((*cached).clone()));
            }
        }

        let record = self.api.get::<R>(document_id).await?;
        if scope.is_some_and(|s| !s.is_mounted()) {
            debug!(resource = %R::KIND, key = %key, "View unmounted, discarding record");
            return Ok(Fetched::Discarded);
        }

        self.cache.insert(key, record.clone()).await;
        Ok(Fetched::Ready(record))
    }

    fn item_key(&self, document_id: &DocumentId) -> CacheKey {
        CacheKey::item(R::KIND, document_id.clone())
    }
}
