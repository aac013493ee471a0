//! Parser Messages
//!
//! Diagnostics reported while the grove is built are kept in arrival order
//! and exposed as message nodes on the document.

use std::fmt;

use grove_decl::Location;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// One diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
    pub location: Option<Location>,
}

impl Message {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            location: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Mirror into the tracing stream
    pub(crate) fn trace(&self) {
        match self.severity {
            Severity::Info => tracing::info!(text = %self.text, "grove message"),
            Severity::Warning => tracing::warn!(text = %self.text, "grove message"),
            Severity::Error => tracing::error!(text = %self.text, "grove message"),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}: {}", self.severity, self.text),
            None => write!(f, "{}: {}", self.severity, self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let message = Message::error("duplicate ID \"A\"");
        assert_eq!(message.to_string(), "error: duplicate ID \"A\"");
        assert!(Severity::Error > Severity::Warning);
    }
}
