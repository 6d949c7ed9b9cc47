// Application state (AppState)

use crate::core::config::Config;
use crate::stores::user_store::UserStore;
use std::sync::Arc;

/// Shared application state
///
/// Handed to every request handler. The store is the only mutable state;
/// handlers open their own transaction on it.
#[derive(Clone)]
pub struct AppState {
    /// Persistent user table
    pub store: Arc<UserStore>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: UserStore) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}
