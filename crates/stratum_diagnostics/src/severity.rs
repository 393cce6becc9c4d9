//! How serious a floorplanner diagnostic is.
//!
//! Errors come from input validation and stop a run before the search
//! starts. Warnings flag a run that continues in a degraded state, such as a
//! start that violates a strict alignment. Notes carry progress and hotspot
//! reports and are the only diagnostics subject to [`Verbosity`](crate::Verbosity)
//! filtering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic message, least severe first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress or analysis output.
    Note,
    /// The run goes on, but its result may not meet every requirement.
    Warning,
    /// Malformed input; the search does not start.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Returns `true` if the sink drops diagnostics of this severity below
    /// their verbosity level.
    pub fn is_filtered(self) -> bool {
        self == Severity::Note
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_outrank_warnings_outrank_notes() {
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(
            [Severity::Error, Severity::Note, Severity::Warning].iter().max(),
            Some(&Severity::Error)
        );
    }

    #[test]
    fn only_errors_stop_a_run() {
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert!(!Severity::Note.is_error());
    }

    #[test]
    fn only_notes_are_filtered() {
        assert!(Severity::Note.is_filtered());
        assert!(!Severity::Warning.is_filtered());
        assert!(!Severity::Error.is_filtered());
    }

    #[test]
    fn display_and_json_use_lowercase() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(
            serde_json::to_string(&Severity::Note).unwrap(),
            "\"note\""
        );
        let back: Severity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(back, Severity::Error);
    }
}
