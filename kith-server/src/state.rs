use std::path::PathBuf;

use kith_core::config::GlobalConfig;
use kith_core::store::Store;
use kith_core::KithResult;

use crate::mailer::Mailer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub mailer: Mailer,
    db_path: PathBuf,
}

impl AppState {
    pub fn new(config: GlobalConfig) -> KithResult<Self> {
        let db_path = config.database_path();

        // Verify the store opens (and migrates) at startup
        let _ = Store::open(&db_path)?;

        Ok(AppState {
            mailer: Mailer::new(&config.mail),
            db_path,
        })
    }

    // A connection per request keeps handlers free of shared mutable state
    pub fn store(&self) -> KithResult<Store> {
        Store::open(&self.db_path)
    }
}
