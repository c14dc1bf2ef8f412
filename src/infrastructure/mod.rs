pub mod notification;
pub mod observability;
pub mod persistence;
pub mod processing;
