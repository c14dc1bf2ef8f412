mod document;
mod job;
mod job_id;
mod job_patch;
mod job_status;
mod notification;
mod outbox_entry;
mod user_id;

pub use document::{DocumentId, DocumentMetadata};
pub use job::{Job, JobStateError};
pub use job_id::JobId;
pub use job_patch::JobPatch;
pub use job_status::JobStatus;
pub use notification::OutcomeNotification;
pub use outbox_entry::{OutboxEntry, OutboxEntryId};
pub use user_id::UserId;
