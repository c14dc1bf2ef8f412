mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    CallbackSettings, DatabaseSettings, LoggingSettings, ProcessingSettings, RetrySettings,
    ServerSettings, Settings, WorkerSettings,
};
