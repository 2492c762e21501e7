//! Sensitive data marker for automatic redaction
//!
//! The draft preview secret is held in a `Sensitive<String>` so that it can
//! never end up in a log line or a `Debug` dump of the signer.

use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use quire_core_types::Sensitive;
///
/// let secret = Sensitive::new("draft-secret");
/// assert_eq!(format!("{:?}", secret), "***REDACTED***");
/// assert_eq!(secret.expose(), &"draft-secret");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Only call this where the raw value is needed, e.g. as HMAC key material.
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let secret = Sensitive::new("my-draft-secret");
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, "***REDACTED***");
        assert!(!debug_str.contains("my-draft-secret"));
    }

    #[test]
    fn test_sensitive_display_redaction() {
        let secret = Sensitive::new("abc123");
        assert_eq!(format!("{}", secret), "***REDACTED***");
    }

    #[test]
    fn test_sensitive_expose_and_into_inner() {
        let secret = Sensitive::new(String::from("key"));
        assert_eq!(secret.expose(), "key");
        assert_eq!(secret.into_inner(), "key");
    }

    #[test]
    fn test_sensitive_in_struct_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Signer {
            name: String,
            secret: Sensitive<String>,
        }

        let signer = Signer {
            name: "DRAFT_SECRET_KEY".to_string(),
            secret: Sensitive::new("s3cret".to_string()),
        };

        let debug_str = format!("{:?}", signer);
        assert!(debug_str.contains("DRAFT_SECRET_KEY"));
        assert!(debug_str.contains("***REDACTED***"));
        assert!(!debug_str.contains("s3cret"));
    }
}
