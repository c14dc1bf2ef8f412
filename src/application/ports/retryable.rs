/// Classifies an outbound-call failure for the retry policy.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}
