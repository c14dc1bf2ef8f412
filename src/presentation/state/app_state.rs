use std::sync::Arc;

use crate::application::services::IngestionService;

#[derive(Clone)]
pub struct AppState {
    pub ingestion_service: Arc<IngestionService>,
}

impl AppState {
    pub fn new(ingestion_service: Arc<IngestionService>) -> Self {
        Self { ingestion_service }
    }
}
