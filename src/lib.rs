pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod facade;

pub use db::DbPool;

use config::Config;
use facade::Facade;
use metrics_exporter_prometheus::PrometheusHandle;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub facade: Facade,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, facade: Facade) -> Self {
        Self {
            config,
            db,
            facade,
            metrics_handle: None,
        }
    }

    /// Set the Prometheus metrics handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
