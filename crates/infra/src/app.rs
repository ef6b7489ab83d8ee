//! Service wiring from a loaded [`Config`]

use std::sync::Arc;

use recreviews_common::time::{Clock, SystemClock};
use recreviews_core::{
    ApiTransport, ConfigStore, OAuthClient, OAuthFlow, OrderStore, OrderSyncEngine, RemoteApi,
    SyncSettings, TokenStore,
};
use recreviews_domain::{Config, Result};
use tracing::info;

use crate::api::{ApiClient, ApiClientConfig};
use crate::database::{DbManager, SqliteConfigStore, SqliteOrderStore};
use crate::scheduling::{SyncScheduler, SyncSchedulerConfig};

/// Every service of the connector over one SQLite database and one
/// dashboard client.
pub struct Connector {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub options: Arc<SqliteConfigStore>,
    pub orders: Arc<SqliteOrderStore>,
    pub tokens: Arc<TokenStore>,
    pub flow: Arc<OAuthFlow>,
    pub engine: Arc<OrderSyncEngine>,
}

impl Connector {
    /// Open the database, run migrations and build the services.
    ///
    /// # Errors
    /// Storage failures and HTTP client construction failures.
    pub fn build(config: Config) -> Result<Self> {
        Self::build_with_clock(config, Arc::new(SystemClock))
    }

    pub fn build_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.storage.path, config.storage.pool_size)?);
        db.run_migrations()?;

        let options = Arc::new(SqliteConfigStore::new(Arc::clone(&db)));
        let orders = Arc::new(SqliteOrderStore::new(Arc::clone(&db), config.shop.locale.clone()));

        let client = ApiClient::new(ApiClientConfig::from(&config.api))?;
        let base_url = client.base_url().to_string();
        let transport: Arc<dyn ApiTransport> = Arc::new(client);

        let oauth = OAuthClient::new(Arc::clone(&transport));
        let api = Arc::new(RemoteApi::new(transport));
        let config_store: Arc<dyn ConfigStore> = options.clone();
        let order_store: Arc<dyn OrderStore> = orders.clone();

        let tokens =
            Arc::new(TokenStore::new(Arc::clone(&config_store), oauth.clone(), Arc::clone(&clock)));
        let flow = Arc::new(OAuthFlow::new(
            Arc::clone(&config_store),
            Arc::clone(&tokens),
            oauth,
            Arc::clone(&api),
            Arc::clone(&clock),
            config.shop.clone(),
            base_url,
        ));
        let engine = Arc::new(OrderSyncEngine::new(
            order_store,
            config_store,
            Arc::clone(&tokens),
            api,
            clock,
            SyncSettings::from_config(&config),
        ));

        info!(db_path = %db.path().display(), api = %config.api.base_url, "connector services ready");

        Ok(Self { config, db, options, orders, tokens, flow, engine })
    }

    /// Periodic sweep driver, `None` when sync is disabled.
    pub fn scheduler(&self) -> Option<SyncScheduler> {
        self.config.sync.enabled.then(|| {
            SyncScheduler::new(self.engine.clone(), SyncSchedulerConfig::from(&self.config.sync))
        })
    }
}
