mod http_callback_notifier;
mod recording_notifier;

pub use http_callback_notifier::HttpCallbackNotifier;
pub use recording_notifier::{RecordedNotification, RecordingCallbackNotifier};
