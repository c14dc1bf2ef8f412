/// Caller-issued changes to a non-terminal job.
///
/// `expected_version`, when present, must match the stored version or the
/// update is rejected as stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub job_type: Option<String>,
    pub callback_url: Option<String>,
    pub expected_version: Option<i64>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.job_type.is_none() && self.callback_url.is_none()
    }
}
