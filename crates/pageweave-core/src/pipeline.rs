//! The recursive load pipeline: path resolution, reading, parsing, the
//! directive walk, inclusion splicing and macro-definition registration,
//! all interleaved in a single post-order tree rewrite per file.
//!
//! Inclusion requires awaiting file I/O recursively, so the two driving
//! functions (`load_file`, `rewrite_children`) are written as ordinary
//! functions returning a boxed future rather than `async fn` — Rust does
//! not support recursive `async fn` directly.

use std::future::Future;
use std::pin::Pin;

use pageweave_config::Config;
use pageweave_parser::MarkupParser;
use pageweave_types::{Attribute, Diagnostic, Element, Kind, Node};

use crate::error::DiagnosticLogger;
use crate::macros;
use crate::path;
use crate::session::CodeSource;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves, reads, parses and shape-checks `resolved_rel`, then rewrites
/// its root's children in place. Returns `None` on any fatal failure
/// (depth, I/O, parse, shape) — the caller treats that as "no insertion".
pub fn load_file<'a>(
    resolved_rel: String,
    session: &'a mut CodeSource,
    cfg: &'a Config,
    parser: &'a dyn MarkupParser,
    logger: &'a dyn DiagnosticLogger,
    depth: usize,
) -> BoxFuture<'a, Option<Element>> {
    Box::pin(async move {
        if depth > cfg.max_nesting {
            session.push_diagnostic(Diagnostic::error(Kind::Depth, "too many nested inclusions"), logger, &resolved_rel);
            return None;
        }

        session.files.push(resolved_rel.clone());

        let full_path = cfg.root.join(&resolved_rel);
        let bytes = match tokio::fs::read(&full_path).await {
            Ok(b) => b,
            Err(_) => {
                session.push_diagnostic(
                    Diagnostic::error(Kind::Io, format!("failed to read \"{}\"", resolved_rel)),
                    logger,
                    &resolved_rel,
                );
                return None;
            }
        };

        let text = match String::from_utf8(bytes) {
            Ok(t) => t,
            Err(_) => {
                session.push_diagnostic(
                    Diagnostic::error(Kind::Io, format!("failed to read \"{}\"", resolved_rel)),
                    logger,
                    &resolved_rel,
                );
                return None;
            }
        };

        let document = match parser.parse(&text, &resolved_rel).await {
            Ok(doc) => doc,
            Err(e) => {
                session.push_diagnostic(
                    Diagnostic::error(Kind::Parse, format!("{} in \"{}\"", e, resolved_rel)),
                    logger,
                    &resolved_rel,
                );
                return None;
            }
        };

        let mut root_el = match document.into_iter().next() {
            Some(Node::Element(e)) => e,
            _ => {
                session.push_diagnostic(
                    Diagnostic::error(Kind::Shape, format!("HTML tag expected \"{}\"", resolved_rel)),
                    logger,
                    &resolved_rel,
                );
                return None;
            }
        };

        rewrite_children(&mut root_el, session, cfg, parser, logger, &resolved_rel, depth).await;
        Some(root_el)
    })
}

/// Rewrites `parent`'s children in document order: known directives are
/// collected and resolved (inclusion splicing, macro registration), an
/// unknown `:`-prefixed tag is dropped with a warning, and everything else
/// is recursed into. Mutation never happens mid-walk: each child's
/// replacement is computed and the whole list rebuilt at the end.
fn rewrite_children<'a>(
    parent: &'a mut Element,
    session: &'a mut CodeSource,
    cfg: &'a Config,
    parser: &'a dyn MarkupParser,
    logger: &'a dyn DiagnosticLogger,
    file_label: &'a str,
    depth: usize,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let old_children = std::mem::take(&mut parent.children);
        let mut new_children = Vec::with_capacity(old_children.len());
        let mut propagated: Vec<Attribute> = Vec::new();

        for child in old_children {
            match child {
                Node::Element(el) if el.is_directive() => match el.tag.as_str() {
                    ":include" | ":import" => {
                        if let Some(result) = include_directive(&el, &mut *session, cfg, parser, logger, file_label, depth).await {
                            for attr in result.attrs {
                                propagated.push(attr);
                            }
                            new_children.extend(result.children);
                        }
                    }
                    ":define" => {
                        let mut el = el;
                        rewrite_children(&mut el, &mut *session, cfg, parser, logger, file_label, depth).await;
                        for diagnostic in macros::collect_define(&el, &mut session.macros) {
                            session.push_diagnostic(diagnostic, logger, file_label);
                        }
                    }
                    ":slot" => {
                        let mut el = el;
                        rewrite_children(&mut el, &mut *session, cfg, parser, logger, file_label, depth).await;
                        new_children.push(Node::Element(el));
                    }
                    other => {
                        session.push_diagnostic(
                            Diagnostic::warning(Kind::Directive, format!("unknown directive {}", other)).with_span(el.span),
                            logger,
                            file_label,
                        );
                    }
                },
                Node::Element(mut el) => {
                    rewrite_children(&mut el, &mut *session, cfg, parser, logger, file_label, depth).await;
                    new_children.push(Node::Element(el));
                }
                other => new_children.push(other),
            }
        }

        parent.children = new_children;
        for attr in propagated {
            if parent.attr(&attr.name).is_none() {
                parent.set_attr(attr.name.clone(), attr.value.clone(), attr.span);
            }
        }
    })
}

struct SpliceResult {
    attrs: Vec<Attribute>,
    children: Vec<Node>,
}

fn trim_blank_edges(mut children: Vec<Node>) -> Vec<Node> {
    if children.first().and_then(Node::as_text).map(|t| t.is_blank()).unwrap_or(false) {
        children.remove(0);
    }
    if children.last().and_then(Node::as_text).map(|t| t.is_blank()).unwrap_or(false) {
        children.pop();
    }
    children
}

fn include_directive<'a>(
    el: &'a Element,
    session: &'a mut CodeSource,
    cfg: &'a Config,
    parser: &'a dyn MarkupParser,
    logger: &'a dyn DiagnosticLogger,
    file_label: &'a str,
    depth: usize,
) -> BoxFuture<'a, Option<SpliceResult>> {
    Box::pin(async move {
        let once = el.tag == ":import";

        let src = match el.attr("src") {
            Some(v) if !v.is_blank() => v.as_literal(),
            _ => None,
        };
        let Some(src) = src else {
            session.push_diagnostic(Diagnostic::error(Kind::Directive, "missing src attribute").with_span(el.span), logger, file_label);
            return None;
        };

        let current_dir = path::dirname(file_label);
        let resolved = match path::resolve(current_dir, src) {
            Ok(rel) => rel,
            Err(requested) => {
                session.push_diagnostic(
                    Diagnostic::error(Kind::Path, format!("forbidden pathname \"{}\"", requested)).with_span(el.span),
                    logger,
                    file_label,
                );
                return None;
            }
        };

        if once && session.files.iter().any(|f| f == &resolved) {
            return None;
        }

        let included = load_file(resolved, session, cfg, parser, logger, depth + 1).await?;
        Some(SpliceResult { attrs: included.attrs, children: trim_blank_edges(included.children) })
    })
}
