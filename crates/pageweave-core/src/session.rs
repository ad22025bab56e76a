//! The per-`load` session state: `CodeSource` and the `Loader` entry point.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use pageweave_config::Config;
use pageweave_parser::{MarkupParser, SimpleMarkupParser};
use pageweave_types::{Diagnostic, Element};

use crate::error::{DefaultDiagnosticLogger, DiagnosticLogger};
use crate::expand::expand_tree;
use crate::macros::MacroDescriptor;
use crate::pipeline::load_file;

/// Everything produced by one `Loader::load` call.
#[derive(Debug, Default)]
pub struct CodeSource {
    /// The final, fully-spliced and macro-expanded tree. Absent only when
    /// the entry file itself failed to resolve, read, parse, or shape-check.
    pub tree: Option<Element>,
    /// Every file visited, in visitation order, relative to the document
    /// root. Contains no duplicates when all inclusions used `:import`.
    pub files: Vec<String>,
    /// Every diagnostic recorded during the load, in the order recorded.
    pub diagnostics: Vec<Diagnostic>,
    /// The file each entry in `diagnostics` was raised while processing —
    /// same length and order as `diagnostics`. Diagnostics raised during
    /// macro expansion (which walks the whole consolidated tree rather
    /// than any single file) are labelled with the entry file.
    pub diagnostic_files: Vec<String>,
    /// Registered macro descriptors, keyed by name.
    pub macros: HashMap<String, MacroDescriptor>,
}

impl CodeSource {
    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic, logger: &dyn DiagnosticLogger, file: &str) {
        logger.log(&diagnostic, file);
        self.diagnostics.push(diagnostic);
        self.diagnostic_files.push(file.to_string());
    }

    /// True if any recorded diagnostic is an error (as opposed to a warning).
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Entry point: resolves, reads, parses, splices and macro-expands a page
/// tree rooted at `entry_file`, confined to the configured document root.
pub struct Loader {
    config: Config,
    parser: Arc<dyn MarkupParser>,
    logger: Arc<dyn DiagnosticLogger>,
}

impl Loader {
    pub fn new(config: Config) -> Self {
        Self { config, parser: Arc::new(SimpleMarkupParser), logger: Arc::new(DefaultDiagnosticLogger) }
    }

    /// Builds a loader confined to `root` with every other setting
    /// defaulted. Handy for tests and for the CLI's plain invocation.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self::new(Config::for_root(root))
    }

    /// Swaps in a different parser implementation, e.g. a test double.
    pub fn with_parser(mut self, parser: Arc<dyn MarkupParser>) -> Self {
        self.parser = parser;
        self
    }

    pub async fn load(&self, entry_file: &str) -> CodeSource {
        let mut session = CodeSource::default();

        let resolved = match crate::path::resolve("", entry_file) {
            Ok(rel) => rel,
            Err(requested) => {
                let d = pageweave_types::Diagnostic::error(
                    pageweave_types::Kind::Path,
                    format!("forbidden pathname \"{}\"", requested),
                );
                session.push_diagnostic(d, self.logger.as_ref(), entry_file);
                return session;
            }
        };

        let root_el = load_file(resolved, &mut session, &self.config, self.parser.as_ref(), self.logger.as_ref(), 0).await;

        if let Some(root_el) = root_el {
            let before = session.diagnostics.len();
            let expanded = expand_tree(root_el, &session.macros, &mut session.diagnostics, self.config.max_nesting);
            for diagnostic in &session.diagnostics[before..] {
                self.logger.log(diagnostic, entry_file);
            }
            let added = session.diagnostics.len() - before;
            session.diagnostic_files.extend(std::iter::repeat(entry_file.to_string()).take(added));
            session.tree = Some(expanded);
        }

        session
    }
}
