//! Diagnostic creation, severity management, verbosity filtering, and rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels,
//! codes, and an optional subject (the block, net, or requirement the message
//! is about). The thread-safe [`DiagnosticSink`] accumulates diagnostics during
//! validation and search, filtering progress notes by an explicit [`Verbosity`]
//! instead of process-wide debug flags. [`DiagnosticRenderer`] implementations
//! format them for the terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;
pub mod verbosity;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
pub use verbosity::Verbosity;
