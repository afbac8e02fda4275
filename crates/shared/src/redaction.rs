//! Secret detection and redaction utilities.
//!
//! Point tags and env values end up in log lines and metric payloads, so
//! anything whose key looks like a credential is replaced before it leaves
//! the process.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

const SECRET_MARKERS: [&str; 6] = ["KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH"];

/// Checks if a key/variable name likely refers to a secret.
///
/// ```
/// use wflambda_shared::is_secret_key;
///
/// assert!(is_secret_key("WAVEFRONT_API_TOKEN"));
/// assert!(is_secret_key("password"));
/// assert!(!is_secret_key("FunctionName"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Redacts a value if the key is likely a secret.
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
