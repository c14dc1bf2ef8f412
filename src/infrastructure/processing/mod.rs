mod http_processing_client;
mod mock_processing_client;

pub use http_processing_client::{HttpProcessingClient, PROCESS_PATH};
pub use mock_processing_client::{MockProcessingClient, ProcessingCall};
