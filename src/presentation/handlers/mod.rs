mod error;
mod health;
mod ingestion;
mod principal;

pub use error::ErrorResponse;
pub use health::health_handler;
pub use ingestion::{
    CreateIngestionRequest, IngestionJobResponse, UpdateIngestionRequest,
    create_ingestion_handler, delete_ingestion_handler, get_ingestion_handler,
    list_ingestions_handler, update_ingestion_handler,
};
pub use principal::{Principal, USER_ID_HEADER};
