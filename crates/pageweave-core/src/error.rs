//! Diagnostic logging for the pageweave loader.
//!
//! The pipeline itself never throws (see the crate-level docs): every
//! recoverable failure becomes a [`Diagnostic`] appended to the session.
//! This module supplies the one piece of ambient error *handling* the
//! pipeline still needs — forwarding those diagnostics to the `log` facade
//! as they are recorded.

use pageweave_types::{Diagnostic, Severity};

/// Forwards recorded diagnostics to whatever logging backend the host
/// process has configured. Kept as a trait so tests can swap in a
/// capturing logger instead of hitting `log`'s global dispatcher.
pub trait DiagnosticLogger: Send + Sync {
    fn log(&self, diagnostic: &Diagnostic, file: &str);
}

/// Logs through the `log` crate, at a level matching each severity.
#[derive(Debug, Default)]
pub struct DefaultDiagnosticLogger;

impl DiagnosticLogger for DefaultDiagnosticLogger {
    fn log(&self, diagnostic: &Diagnostic, file: &str) {
        match diagnostic.severity {
            Severity::Error => {
                log::error!(target: "pageweave::core", "{} [{}]", diagnostic, file)
            }
            Severity::Warning => {
                log::warn!(target: "pageweave::core", "{} [{}]", diagnostic, file)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageweave_types::Kind;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct CapturingLogger(Arc<Mutex<Vec<String>>>);

    impl DiagnosticLogger for CapturingLogger {
        fn log(&self, diagnostic: &Diagnostic, file: &str) {
            self.0.lock().unwrap().push(format!("{} [{}]", diagnostic, file));
        }
    }

    #[test]
    fn capturing_logger_records_formatted_diagnostic() {
        let logger = CapturingLogger::default();
        let d = Diagnostic::error(Kind::Path, "forbidden pathname \"../etc\"");
        logger.log(&d, "index.html");
        assert_eq!(logger.0.lock().unwrap()[0], "error: forbidden pathname \"../etc\" [index.html]");
    }
}
