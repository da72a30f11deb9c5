//! LaTeX document handling: envelope markers, sanitization, compilation,
//! and failure triage.
//!
//! The envelope check is deliberately string-based (substring search for the
//! two markers below). It lives behind `sanitize` so a real parser could be
//! swapped in without touching the repair loop.

pub mod compiler;
pub mod sanitize;
pub mod template;
pub mod triage;

/// Marker every valid document must start with.
pub const DOC_START: &str = "\\documentclass";

/// Marker every valid document must contain.
pub const DOC_END: &str = "\\end{document}";
