use anyhow::{Context, Result};
use tracing::info;

use crate::core::config::{Config, DatabaseTarget};
use crate::stores::user_store::UserStore;

// this runs at boot time
pub fn open_store(config: &Config) -> Result<UserStore> {
    let target = config.database.target()?;

    match &target {
        DatabaseTarget::Memory => info!("Opening in-memory database"),
        DatabaseTarget::File(path) => info!(path = %path.display(), "Opening database"),
    }

    let store = UserStore::open(&target)
        .context(format!("Failed to open database '{}'", config.database.uri))?;

    let users = store.count().context("Failed to count users")?;
    info!(users, "Schema ready");

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_store_creates_file_and_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("boot.db");

        let mut config = Config::default();
        config.override_database_uri(Some(path.display().to_string()));

        let store = open_store(&config).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_open_store_rejects_unknown_scheme() {
        let mut config = Config::default();
        config.override_database_uri(Some("mysql://localhost/guestbook".to_string()));

        assert!(open_store(&config).is_err());
    }
}
