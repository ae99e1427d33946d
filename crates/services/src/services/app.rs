//! Composition root: every service is built once here and handed out by reference.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::{
    api_client::{ApiClient, ApiError},
    auth::AuthService,
    cache::QueryCache,
    config::DashboardConfig,
    confirmation::ConfirmationService,
    finances::FinanceService,
    modal::ModalService,
    navigation::{self, Route},
    resource::{ClientService, ExpenseService, IncomeService, ProjectService, ResourceService},
    session::SessionStore,
    storage::{DurableStorage, FileStorage, StorageError},
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open session storage: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to build api client: {0}")]
    Api(#[from] ApiError),
}

#[derive(Debug)]
pub struct DashboardServices {
    pub config: DashboardConfig,
    pub session: Arc<SessionStore>,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub auth: AuthService,
    pub clients: ClientService,
    pub projects: ProjectService,
    pub incomes: IncomeService,
    pub expenses: ExpenseService,
    pub finances: FinanceService,
    pub confirmations: ConfirmationService,
    pub modals: ModalService,
}

impl DashboardServices {
    pub fn new(config: DashboardConfig, storage: Arc<dyn DurableStorage>) -> Result<Self, StartupError> {
        let session = Arc::new(SessionStore::restore(storage));
        let api = ApiClient::new(&config, session.clone())?;
        let cache = QueryCache::new(config.cache_capacity, config.cache_ttl);

        let clients = ResourceService::new(api.clone(), cache.clone());
        let projects = ResourceService::new(api.clone(), cache.clone());
        let incomes: IncomeService = ResourceService::new(api.clone(), cache.clone());
        let expenses: ExpenseService = ResourceService::new(api.clone(), cache.clone());
        let confirmations = ConfirmationService::new();
        let finances = FinanceService::new(incomes.clone(), expenses.clone(), confirmations.clone());
        let auth = AuthService::new(api.clone(), cache.clone());

        info!(
            api_url = %config.api_url,
            authenticated = session.is_authenticated(),
            "Dashboard services ready"
        );

        Ok(Self {
            config,
            session,
            api,
            cache,
            auth,
            clients,
            projects,
            incomes,
            expenses,
            finances,
            confirmations,
            modals: ModalService::new(),
        })
    }

    /// Services backed by the session file named in `config`.
    pub fn from_config(config: DashboardConfig) -> Result<Self, StartupError> {
        let storage = FileStorage::open(&config.session_file)?;
        Self::new(config, Arc::new(storage))
    }

    pub fn navigate(&self, requested: Route) -> Route {
        navigation::guard(&self.session, requested)
    }
}
