//! Default values for configuration

use crate::source::ContextSource;

/// Default backend URL for local development (the answering service's default port)
pub fn default_backend_url() -> String {
    std::env::var("PAPERDESK_BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string())
}

/// Default: no request timeout, a hung backend keeps the cycle in flight
pub fn default_request_timeout_secs() -> Option<u64> {
    None
}

/// Default accepted filename extensions
pub fn default_accepted_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

/// Default accepted media types
pub fn default_accepted_media_types() -> Vec<String> {
    vec!["application/pdf".to_string()]
}

/// Default maximum characters of a file name shown in notifications
pub fn default_max_display_name_chars() -> usize {
    30
}

/// Default delay before a completed upload entry disappears (1.5 seconds)
pub fn default_progress_clear_delay_ms() -> u64 {
    1500
}

/// Default read chunk size (64 KB)
pub fn default_read_chunk_bytes() -> usize {
    64 * 1024
}

/// Default visible window of a notification (3 seconds)
pub fn default_notification_duration_ms() -> u64 {
    3000
}

/// Default context source for a new session
pub fn default_context_source() -> ContextSource {
    ContextSource::Both
}
