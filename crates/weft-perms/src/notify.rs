//! User-facing permission change notifications.

use weft_core::Permission;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Warning,
}

/// Output channel for user-facing notifications. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity)
    }
}

/// Message and severity announcing that the local peer now has `permission`.
pub fn notification_for(permission: Permission) -> (&'static str, Severity) {
    match permission {
        Permission::Owner => ("You are now the owner of this workspace", Severity::Success),
        Permission::Editor => ("You now have editor access to this workspace", Severity::Info),
        Permission::Viewer => ("Your access to this workspace is now view-only", Severity::Warning),
    }
}

/// Notifier that writes to the log. Used when no presentation layer is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Warning => tracing::warn!(target: "weft::notify", "{}", message),
            Severity::Success | Severity::Info => {
                tracing::info!(target: "weft::notify", ?severity, "{}", message)
            }
        }
    }
}
