//! Explicit verbosity levels passed to every stage that reports progress.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much informational output a run should produce.
///
/// Errors and warnings are always kept; notes are kept only when the note's
/// required level is at or below the configured verbosity.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only errors and warnings.
    Quiet,
    /// Phase summaries.
    #[default]
    Normal,
    /// Phase transitions and reheats.
    Verbose,
    /// Per-temperature-level progress.
    Debug,
}

impl Verbosity {
    /// Returns `true` if output requiring `level` should be produced.
    pub fn allows(self, level: Verbosity) -> bool {
        self >= level
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Quiet => write!(f, "quiet"),
            Verbosity::Normal => write!(f, "normal"),
            Verbosity::Verbose => write!(f, "verbose"),
            Verbosity::Debug => write!(f, "debug"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_is_monotonic() {
        assert!(Verbosity::Debug.allows(Verbosity::Verbose));
        assert!(Verbosity::Verbose.allows(Verbosity::Verbose));
        assert!(!Verbosity::Normal.allows(Verbosity::Verbose));
        assert!(!Verbosity::Quiet.allows(Verbosity::Normal));
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&Verbosity::Debug).unwrap();
        assert_eq!(json, "\"debug\"");
    }
}
