use crate::models::LedgerData;
use crate::rollup_cache::RollupCache;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<LedgerData>>,
    /// Summary cards last rendered into the index page.
    pub summary_view: Arc<Mutex<RollupCache<String>>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: LedgerData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            summary_view: Arc::new(Mutex::new(RollupCache::new())),
        }
    }
}
