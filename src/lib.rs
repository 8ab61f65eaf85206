use std::sync::Arc;

use config::Config;
use store::CatalogStore;

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, config: Config) -> Self {
        Self { store, config }
    }
}
