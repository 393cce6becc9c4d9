//! Thread-safe diagnostic accumulator with verbosity filtering.

use crate::diagnostic::Diagnostic;
use crate::verbosity::Verbosity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A thread-safe accumulator for diagnostics emitted during a floorplanning run.
///
/// Multiple threads can emit diagnostics concurrently via [`emit`](Self::emit).
/// The error count is tracked atomically for fast `has_errors` checks without
/// locking the diagnostic vector. Notes are dropped on emission when the sink's
/// [`Verbosity`] is below the note's level.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
    verbosity: Verbosity,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink with [`Verbosity::Normal`].
    pub fn new() -> Self {
        Self::with_verbosity(Verbosity::Normal)
    }

    /// Creates a new empty diagnostic sink with the given verbosity.
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
            verbosity,
        }
    }

    /// Returns the verbosity this sink filters notes with.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Returns `true` if notes at `level` would be kept.
    ///
    /// Lets callers skip formatting progress messages that would be dropped.
    pub fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity.allows(level)
    }

    /// Emits a diagnostic into the sink.
    ///
    /// Errors bump the error count atomically; notes below the sink's
    /// verbosity are dropped.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        } else if diag.severity.is_filtered() && !self.enabled(diag.level) {
            return;
        }
        self.lock().push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // A panicking emitter cannot leave the vector half-written.
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
