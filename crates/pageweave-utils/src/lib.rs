//! Small formatting and path helpers shared by the CLI and, where useful,
//! the other library crates.

use pageweave_types::Diagnostic;

/// Renders a diagnostic for terminal output, prefixed with the file it
/// occurred in and, when the diagnostic carries one, its source position.
/// `Diagnostic`'s own `Display` only covers severity and message — it has
/// no notion of "which file", since a session accumulates diagnostics
/// across many files.
pub fn format_diagnostic(file: &str, diagnostic: &Diagnostic) -> String {
    match diagnostic.span {
        Some(span) => format!("{}:{}:{}: {}", file, span.start.line, span.start.column, diagnostic),
        None => format!("{}: {}", file, diagnostic),
    }
}

/// Joins a document-root-relative path onto the entry file's own directory
/// for display purposes, e.g. reporting which included file a diagnostic
/// without its own file label belongs under.
pub fn display_path(root: &std::path::Path, rel: &str) -> String {
    root.join(rel).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageweave_types::{Kind, Position, Span};

    #[test]
    fn formats_diagnostic_with_span_as_line_colon_column() {
        let span = Span { start: Position { offset: 12, line: 3, column: 5 }, end: Position { offset: 12, line: 3, column: 5 } };
        let diagnostic = Diagnostic::error(Kind::Directive, "missing src attribute").with_span(span);
        assert_eq!(format_diagnostic("index.html", &diagnostic), "index.html:3:5: error: missing src attribute");
    }

    #[test]
    fn formats_diagnostic_without_span_as_file_colon_message() {
        let diagnostic = Diagnostic::error(Kind::Io, "failed to read \"index.html\"");
        assert_eq!(format_diagnostic("index.html", &diagnostic), "index.html: error: failed to read \"index.html\"");
    }

    #[test]
    fn joins_relative_path_under_root_for_display() {
        let root = std::path::Path::new("/srv/pages");
        assert_eq!(display_path(root, "components/card.html"), "/srv/pages/components/card.html");
    }
}
