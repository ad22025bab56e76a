//! Macro registration (`:define` handling).
//!
//! Registering a macro turns a `:define` directive element into a
//! [`MacroDescriptor`] stored in the session's registry. When the
//! definition inherits from another macro (its `base` names one already
//! registered), the new body is expanded against the parent once, here, at
//! registration time rather than at every later use site.

use std::collections::HashMap;

use regex::Regex;

use pageweave_types::{Diagnostic, Element, Kind, Node, Span};

use crate::expand::{stamp, StampMode};

/// A registered macro: the tag name it replaces, the concrete tag its
/// stamped output ultimately carries, the body template to clone at each
/// use site, and (when inheriting) the parent macro's name.
#[derive(Debug, Clone)]
pub struct MacroDescriptor {
    pub name: String,
    pub base: String,
    pub body: Element,
    pub from: Option<String>,
}

fn tag_name_pattern() -> &'static Regex {
    static RE: once_cell::sync::OnceCell<Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[-\w]+$").unwrap())
}

fn is_valid_tag_name(name: &str) -> bool {
    tag_name_pattern().is_match(name) && name.contains('-')
}

/// `base` has no dash requirement (see §6: `^[-\w]+$`, plain tags like
/// `div`/`span` are the common case) — only the macro's own `name` must
/// look like a custom element.
fn is_valid_base_name(base: &str) -> bool {
    tag_name_pattern().is_match(base)
}

/// Registers a `:define` element (already stripped of its own children's
/// directives by the caller's post-order walk) into `macros`. Returns every
/// diagnostic raised along the way (invalid tag name, or any diagnostic from
/// the one-shot inheritance expansion); on failure the definition is simply
/// not registered. The caller attaches the originating file to each
/// diagnostic, since this function has no file context of its own.
pub fn collect_define(el: &Element, macros: &mut HashMap<String, MacroDescriptor>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let Some(tag_attr) = el.attr_str("tag").filter(|s| !s.trim().is_empty()) else {
        diagnostics.push(Diagnostic::warning(Kind::Directive, "invalid tag name").with_span(el.span));
        return diagnostics;
    };

    let (name, base) = match tag_attr.split_once(':') {
        Some((name, base)) => (name.to_string(), base.to_string()),
        None => (tag_attr.to_string(), "div".to_string()),
    };

    if !is_valid_tag_name(&name) {
        diagnostics.push(Diagnostic::warning(Kind::Directive, "invalid tag name").with_span(el.span));
        return diagnostics;
    }
    if !is_valid_base_name(&base) {
        diagnostics.push(Diagnostic::warning(Kind::Directive, "invalid tag name").with_span(el.span));
        return diagnostics;
    }

    let from = if base.contains('-') && macros.contains_key(&base) { Some(base.clone()) } else { None };

    let mut body = build_body(el);
    body.remove_attr("tag");
    body.rename(base.clone());
    if body.self_closing {
        body.promote_to_paired();
    }

    if let Some(parent_name) = &from {
        let parent = macros.get(parent_name).expect("checked by contains_key above").clone();
        let span = body.span;
        let attrs = std::mem::take(&mut body.attrs);
        let children = std::mem::take(&mut body.children);
        body = stamp(&parent, &attrs, children, StampMode::Inherit, span, &mut diagnostics);
    }

    macros.insert(name.clone(), MacroDescriptor { name, base, body, from });
    diagnostics
}

/// A `:define` element's body is its first element child, if it has one
/// (the `:define` wrapper itself never appears in the output); otherwise
/// the stored body is the `:define` element itself, promoted to carry
/// content. This mirrors the two ways a definition can be written: with
/// explicit markup content, or self-closing / content-free.
fn build_body(define_el: &Element) -> Element {
    match define_el.children.iter().find_map(Node::as_element) {
        Some(first) => first.clone(),
        None => define_el.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageweave_types::AttrValue;

    fn define_with_tag(tag: &str, body_children: Vec<Node>) -> Element {
        let mut el = Element::new(":define", Span::empty());
        el.self_closing = false;
        el.set_attr("tag", AttrValue::Literal(tag.to_string()), Span::empty());
        el.children = body_children;
        el
    }

    fn slot(name: &str) -> Node {
        let mut el = Element::new(":slot", Span::empty());
        el.set_attr("name", AttrValue::Literal(name.to_string()), Span::empty());
        Node::Element(el)
    }

    fn card_div() -> Element {
        let mut div = Element::new("div", Span::empty());
        div.self_closing = false;
        div.set_attr("class", AttrValue::Literal("card".to_string()), Span::empty());
        div.children = vec![slot("header"), slot("default")];
        div
    }

    #[test]
    fn registers_macro_with_default_base_from_single_child() {
        let define = define_with_tag("my-card", vec![Node::Element(card_div())]);
        let mut macros = HashMap::new();
        let diags = collect_define(&define, &mut macros);

        assert!(diags.is_empty());
        let descriptor = macros.get("my-card").expect("registered");
        assert_eq!(descriptor.base, "div");
        assert_eq!(descriptor.body.tag, "div");
        assert_eq!(descriptor.body.attr_str("class"), Some("card"));
        assert!(descriptor.body.attr("tag").is_none());
    }

    #[test]
    fn rejects_tag_name_without_dash() {
        let define = define_with_tag("card", vec![Node::Element(card_div())]);
        let mut macros = HashMap::new();
        let diags = collect_define(&define, &mut macros);

        assert!(macros.is_empty());
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("invalid tag name"));
    }

    #[test]
    fn self_closing_definition_is_promoted_to_paired() {
        let mut define = Element::new(":define", Span::empty());
        define.set_attr("tag", AttrValue::Literal("my-badge:span".to_string()), Span::empty());
        define.set_attr("class", AttrValue::Literal("badge".to_string()), Span::empty());
        let mut macros = HashMap::new();
        let diags = collect_define(&define, &mut macros);

        // A plain-tag base with no dash (the common case) is valid: only
        // the macro's own name is held to the custom-element convention.
        assert!(diags.is_empty());
        let descriptor = macros.get("my-badge").expect("registered");
        assert_eq!(descriptor.base, "span");
        assert_eq!(descriptor.body.tag, "span");
        assert!(!descriptor.body.self_closing);
        assert_eq!(descriptor.body.attr_str("class"), Some("badge"));
    }

    #[test]
    fn inheriting_definition_expands_against_parent_at_registration() {
        let parent = define_with_tag("my-card", vec![Node::Element(card_div())]);
        let mut macros = HashMap::new();
        let diags = collect_define(&parent, &mut macros);
        assert!(diags.is_empty());
        assert!(macros.contains_key("my-card"));

        // <:define tag="my-big:my-card"><my-card class="big">...</my-card></:define>
        let mut child_body = Element::new("my-card", Span::empty());
        child_body.self_closing = false;
        child_body.set_attr("class", AttrValue::Literal("big".to_string()), Span::empty());
        let child_define = define_with_tag("my-big:my-card", vec![Node::Element(child_body)]);

        let diags = collect_define(&child_define, &mut macros);
        assert!(diags.is_empty());

        let descriptor = macros.get("my-big").expect("registered");
        assert_eq!(descriptor.from.as_deref(), Some("my-card"));
        // Inheritance expansion has already flattened to the grandparent's
        // concrete tag and merged the "big" class onto it.
        assert_eq!(descriptor.body.tag, "div");
        assert_eq!(descriptor.body.attr_str("class"), Some("big"));
    }
}
