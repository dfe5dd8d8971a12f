use tracing::warn;

pub const ALERT_ERROR_TITLE: &str = "Erro";

/// Blocking user notification (an alert dialog on the device).
///
/// Called at most once per failed fetch.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, title: &str, message: &str);
}

/// Writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_error(&self, title: &str, message: &str) {
        warn!(%title, %message, "user alert");
    }
}
