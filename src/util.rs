//! Shared utility functions

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Controller state is plain data (flags, vectors, counters); a panic in one
/// handler never leaves it half-written in a way later handlers can't cope with.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Safely truncate a string to at most `max_bytes` while respecting UTF-8 boundaries.
///
/// Used to keep user-typed queries short in log lines. Vietnamese text is
/// mostly multi-byte, so a naive slice would panic mid-character.
///
/// # Examples
///
/// ```
/// use tripsearch::util::truncate_utf8_safe;
///
/// assert_eq!(truncate_utf8_safe("hello world", 5), "hello");
///
/// // "Đà" is 2 + 2 bytes in NFC
/// let truncated = truncate_utf8_safe("Đà Lạt", 3);
/// assert_eq!(truncated, "Đ");
/// ```
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Maximum bytes of a query echoed into log lines
pub(crate) const LOG_QUERY_MAX: usize = 64;

/// Shorten a query for logging
pub(crate) fn log_query(query: &str) -> &str {
    truncate_utf8_safe(query, LOG_QUERY_MAX)
}
