//! Application state

use flow_core::AccountService;
use flow_db::UsersDb;

use crate::{config::ServerConfig, error::ServerResult};

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub service: AccountService,
}

impl AppState {
    /// Connect to the database and build the account service.
    ///
    /// A database that cannot be reached is fatal.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let db = UsersDb::connect(&config.database_url).await?;
        let accounts = flow_db::queries::count_accounts(db.pool()).await?;
        tracing::info!(accounts, "users database ready");

        let service = AccountService::from_config(db, &config.flow_config())?;

        Ok(Self { config, service })
    }

    /// State around an already constructed service.
    pub fn with_service(config: ServerConfig, service: AccountService) -> Self {
        Self { config, service }
    }

    pub fn db(&self) -> &UsersDb {
        self.service.db()
    }
}
