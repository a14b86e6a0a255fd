pub mod auth;
pub mod circles;
pub mod month;

use anyhow::Result;
use kith_core::config::GlobalConfig;
use kith_core::store::Store;

/// Open the store configured for this machine.
pub fn open_store() -> Result<Store> {
    let config = GlobalConfig::load()?;
    Ok(Store::open(config.database_path())?)
}
