//! Syntax tree and diagnostic types shared by the pageweave loader.
//!
//! The tree is the one artifact every other crate in this workspace passes
//! around: the parser bridge produces it, the inclusion engine splices it,
//! the macro expander stamps clones of it. Modeling it as a plain sum type
//! (no trait objects, no parent pointers) keeps cloning and structural
//! equality cheap and keeps the rewriting passes in `pageweave-core` free of
//! lifetime gymnastics.

use serde::{Deserialize, Serialize};

/// A byte offset plus the line/column it corresponds to in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn start() -> Self {
        Self { offset: 0, line: 1, column: 1 }
    }
}

/// A source range. Synthesized nodes (splice results, slot defaults, macro
/// clones) inherit the span of whatever triggered their creation rather
/// than carrying an empty one, so downstream diagnostics still point
/// somewhere useful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn empty() -> Self {
        Self { start: Position::start(), end: Position::start() }
    }
}

/// An attribute value is either a literal string or an opaque expression
/// island (`{{ ... }}`). The loader never evaluates the latter; it only
/// needs to carry it through splices and macro clones verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Literal(String),
    Expr(ExprFragment),
}

impl AttrValue {
    /// Returns the literal text if this value is not an expression island.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            AttrValue::Literal(s) => Some(s.as_str()),
            AttrValue::Expr(_) => None,
        }
    }

    /// True when the value is blank (missing, or a literal that trims to
    /// nothing). Used by directive attribute validation (e.g. `src=""`).
    pub fn is_blank(&self) -> bool {
        match self {
            AttrValue::Literal(s) => s.trim().is_empty(),
            AttrValue::Expr(_) => false,
        }
    }
}

/// A raw expression-island fragment. Opaque to the loader: carried verbatim
/// through every rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprFragment {
    pub raw: String,
    pub span: Span,
}

/// One `name="value"` pair on an element's opening tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
    pub span: Span,
}

impl Attribute {
    pub fn literal(name: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), value: AttrValue::Literal(value.into()), span }
    }
}

/// A literal run of text between markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    pub span: Span,
}

impl TextNode {
    /// True for a run containing only ASCII/Unicode whitespace. Used by the
    /// inclusion splice rule to trim a single leading/trailing blank text
    /// child from an included root.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A child of an element: another element, a text run, or an opaque
/// expression-island fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(TextNode),
    Expr(ExprFragment),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Element(e) => e.span,
            Node::Text(t) => t.span,
            Node::Expr(x) => x.span,
        }
    }
}

/// Reserved prefix marking a directive tag (`:include`, `:define`, ...).
pub const DIRECTIVE_PREFIX: char = ':';

/// The literal name of the slot children route to when they carry no
/// `name` attribute.
pub const DEFAULT_SLOT_NAME: &str = "default";

/// A markup element: tag name, attributes, children, and whether it is
/// self-closing.
///
/// Invariant upheld by every constructor and mutator in this crate: a
/// self-closing element has no children; a paired element's closing tag
/// name always equals `tag` (there is nowhere in this model to store a
/// mismatched one, so the invariant is structural rather than checked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub self_closing: bool,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Element {
    pub fn new(tag: impl Into<String>, span: Span) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            self_closing: true,
            children: Vec::new(),
            span,
        }
    }

    pub fn is_directive(&self) -> bool {
        self.tag.starts_with(DIRECTIVE_PREFIX)
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::as_literal)
    }

    /// Sets an attribute, last-write-wins per the tree invariant: if the
    /// name already exists its value is overwritten in place (preserving
    /// position), otherwise the attribute is appended.
    pub fn set_attr(&mut self, name: impl Into<String>, value: AttrValue, span: Span) {
        let name = name.into();
        if let Some(existing) = self.attrs.iter_mut().find(|a| a.name == name) {
            existing.value = value;
            existing.span = span;
        } else {
            self.attrs.push(Attribute { name, value, span });
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Attribute> {
        let idx = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(idx))
    }

    /// Renames the element's tag. Since the closing tag is not stored
    /// separately (see the struct-level invariant note), this is the only
    /// step a macro definition's "rename opening and closing tag" needs.
    pub fn rename(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Promotes a self-closing element to a paired one with an empty child
    /// list, so it has room to hold spliced/stamped content.
    pub fn promote_to_paired(&mut self) {
        self.self_closing = false;
    }
}

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Coarse classification of a diagnostic's origin, mirrored from the error
/// taxonomy in the design document. Purely informational: the pipeline's
/// control flow branches on `Severity`, not on `Kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    Path,
    Io,
    Parse,
    Shape,
    Directive,
    Depth,
}

/// One recorded diagnostic. The loader never throws for recoverable
/// failures (see `pageweave-core`'s error handling design); instead every
/// such failure becomes one of these, appended to the session's
/// diagnostics list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: Kind,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(kind: Kind, message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, kind, message: message.into(), span: None }
    }

    pub fn warning(kind: Kind, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, kind, message: message.into(), span: None }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attr_overwrites_existing_in_place() {
        let mut el = Element::new("div", Span::empty());
        el.set_attr("class", AttrValue::Literal("a".into()), Span::empty());
        el.set_attr("id", AttrValue::Literal("x".into()), Span::empty());
        el.set_attr("class", AttrValue::Literal("b".into()), Span::empty());

        assert_eq!(el.attrs.len(), 2);
        assert_eq!(el.attr_str("class"), Some("b"));
        assert_eq!(el.attrs[0].name, "class");
    }

    #[test]
    fn is_directive_checks_reserved_prefix() {
        assert!(Element::new(":include", Span::empty()).is_directive());
        assert!(!Element::new("my-card", Span::empty()).is_directive());
    }

    #[test]
    fn attr_value_blank_detection() {
        assert!(AttrValue::Literal("   ".into()).is_blank());
        assert!(!AttrValue::Literal("x".into()).is_blank());
        assert!(!AttrValue::Expr(ExprFragment { raw: "x".into(), span: Span::empty() }).is_blank());
    }

    #[test]
    fn diagnostic_display_includes_severity() {
        let d = Diagnostic::error(Kind::Path, "forbidden pathname \"../etc\"");
        assert_eq!(d.to_string(), "error: forbidden pathname \"../etc\"");
    }
}
