use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::uploads::ResumeStorage;

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub resumes: Arc<ResumeStorage>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let resumes = Arc::new(ResumeStorage::new(&config.uploads));
        Self {
            config: Arc::new(config),
            store,
            resumes,
        }
    }
}
