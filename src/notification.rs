/// Passive user-facing notices for failures the preview window cannot show.
pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);
}

/// Desktop notifications through the system notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        send_with_summary(summary, body);
    }
}

pub fn send(body: impl Into<String>) {
    send_with_summary("QuickPeek", &body.into());
}

fn send_with_summary(summary: &str, body: &str) {
    if let Err(err) = notify_rust::Notification::new()
        .appname("QuickPeek")
        .summary(summary)
        .body(body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}
