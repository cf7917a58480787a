//! Hostname validation
//!
//! snmptrapd prints a placeholder instead of a hostname when it cannot
//! resolve the trap sender. Such notifications get a name derived from the
//! source address so the event still lands on a distinct entity.

use crate::config::DeviceDefaults;
use crate::notification::Notification;
use tracing::{info, warn};

/// Placeholder spellings snmptrapd is known to emit for an unresolved sender.
/// `<UNKONWN>` is a historical misspelling that must keep matching.
/// The JSON-escaped form shows up when the hostname has been round-tripped
/// through an encoder before reaching the handler.
pub const UNKNOWN_HOST_SENTINELS: &[&str] = &["<UNKNOWN>", "<UNKONWN>", r"\u003cUNKNOWN\u003e"];

pub fn is_unknown_host(hostname: &str) -> bool {
    UNKNOWN_HOST_SENTINELS.iter().any(|sentinel| *sentinel == hostname)
}

/// Replacement name for an unresolved sender: the source address with dots
/// turned into underscores, or the configured default device host when the
/// notification has no source address.
pub fn fallback_hostname(notification: &Notification, defaults: &DeviceDefaults) -> String {
    let source = notification.address.source_host.trim();
    if source.is_empty() {
        warn!(
            "Notification has no source address, using default device host {}",
            defaults.host
        );
        return defaults.host.clone();
    }
    source.replace('.', "_")
}

/// Rewrite a placeholder hostname in place. Returns true if it was replaced.
pub fn validate_hostname(notification: &mut Notification, defaults: &DeviceDefaults) -> bool {
    if !is_unknown_host(&notification.hostname) {
        return false;
    }

    let replacement = fallback_hostname(notification, defaults);
    info!(
        "Replacing unresolved hostname {} with {}",
        notification.hostname, replacement
    );
    notification.hostname = replacement;
    true
}
