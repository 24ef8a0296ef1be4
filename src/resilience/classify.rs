//! Retryable-versus-fatal classification.
//!
//! Error types that know their own kind implement [`Classify`] directly.
//! Opaque errors fall back to [`classify_message`], a case-sensitive
//! substring match against a fixed list of transport markers.

/// Verdict for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient; worth another attempt.
    Retryable,
    /// Surfaced immediately.
    Fatal,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Retryable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Retryable => "retryable",
            ErrorClass::Fatal => "fatal",
        }
    }
}

/// Markers that identify a transient failure in an error message.
pub const RETRYABLE_MARKERS: [&str; 5] = ["connection", "network", "reset", "timeout", "ECONNRESET"];

/// Classify an error by its text.
pub fn classify_message(message: &str) -> ErrorClass {
    if RETRYABLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
    {
        ErrorClass::Retryable
    } else {
        ErrorClass::Fatal
    }
}

/// Errors the retry executor can reason about.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}

impl Classify for str {
    fn class(&self) -> ErrorClass {
        classify_message(self)
    }
}

impl Classify for String {
    fn class(&self) -> ErrorClass {
        classify_message(self)
    }
}

impl<T: Classify + ?Sized> Classify for &T {
    fn class(&self) -> ErrorClass {
        (**self).class()
    }
}
