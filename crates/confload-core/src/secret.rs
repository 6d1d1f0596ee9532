//! Passphrase wrapper with automatic zeroing on drop
//!
//! The unlock passphrase lives only in transient buffers owned by whichever
//! component currently needs it. Wrapping it in `Zeroizing` clears the
//! backing memory on every exit path, and Debug/Display always show
//! `[REDACTED]` so it cannot leak through logging or formatting.

use std::fmt;

use zeroize::Zeroizing;

/// A candidate passphrase, zeroed from memory when dropped.
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    /// Wrap a passphrase, consuming the String.
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// Access the raw passphrase. Callers must not copy it into any
    /// longer-lived or persisted buffer.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_shows_redacted() {
        let pass = Passphrase::from("hunter2");
        assert_eq!(format!("{pass:?}"), "[REDACTED]");
    }

    #[test]
    fn test_display_shows_redacted() {
        let pass = Passphrase::from("hunter2");
        assert_eq!(format!("{pass}"), "[REDACTED]");
    }

    #[test]
    fn test_expose_returns_content() {
        let pass = Passphrase::new("correct horse".to_string());
        assert_eq!(pass.expose(), "correct horse");
    }

    #[test]
    fn test_is_empty() {
        assert!(Passphrase::from("").is_empty());
        assert!(!Passphrase::from("x").is_empty());
    }
}
