//! Macro expansion: stamping a macro body out at a use site with named-slot
//! composition.
//!
//! The same stamping routine serves two callers: the post-inclusion
//! expansion pass (`expand_tree`, below) and the one-shot inheritance
//! expansion a child macro runs against its parent at registration time
//! (`pageweave_core::macros`). They differ only in what happens to a slot
//! marker once its routed content has been spliced in — see `StampMode`.

use std::collections::{HashMap, HashSet};

use pageweave_types::{Attribute, Diagnostic, Element, Kind, Node, Span, DEFAULT_SLOT_NAME};

use crate::macros::MacroDescriptor;

/// Distinguishes a terminal expansion (use-site, during the main pass) from
/// a one-shot expansion run while registering a macro that inherits from
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampMode {
    /// Slot markers are fully consumed: each is replaced by whatever was
    /// routed into it (or nothing, if the use-site left it unrouted).
    Final,
    /// Slot markers survive unless the child macro redeclares them. Used
    /// so the resulting body can still be stamped again, later, at the
    /// child macro's own use sites.
    Inherit,
}

/// Runs the stamping algorithm: clones `descriptor.body`, merges `attrs`
/// onto its root, routes `children` into matching `:slot` markers, and
/// finalizes according to `mode`.
pub fn stamp(
    descriptor: &MacroDescriptor,
    attrs: &[Attribute],
    children: Vec<Node>,
    mode: StampMode,
    trigger_span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) -> Element {
    let mut dst = descriptor.body.clone();

    for attr in attrs {
        dst.set_attr(attr.name.clone(), attr.value.clone(), attr.span);
    }

    if !contains_slot_named(&dst, DEFAULT_SLOT_NAME) {
        let mut synthetic = Element::new(":slot", trigger_span);
        synthetic.set_attr("name", pageweave_types::AttrValue::Literal(DEFAULT_SLOT_NAME.to_string()), trigger_span);
        dst.children.push(Node::Element(synthetic));
    }

    let mut routing: HashMap<String, Vec<Node>> = HashMap::new();
    let mut overriding_names: HashSet<String> = HashSet::new();
    for child in children {
        let name = match &child {
            Node::Element(e) => e.attr_str("name").map(str::to_string).unwrap_or_else(|| DEFAULT_SLOT_NAME.to_string()),
            _ => DEFAULT_SLOT_NAME.to_string(),
        };
        // A use-site child that is itself `:slot`-tagged is a wrapper: its
        // own children are what gets routed, not the wrapper element. A
        // plain element that merely carries a `name` attribute is routed
        // whole, but the `name` attribute is routing metadata, consumed
        // like a macro's own `tag` attribute rather than left behind.
        match child {
            Node::Element(e) if e.tag == ":slot" => {
                overriding_names.insert(name.clone());
                routing.entry(name).or_default().extend(e.children);
            }
            Node::Element(mut e) => {
                e.remove_attr("name");
                routing.entry(name).or_default().push(Node::Element(e));
            }
            other => {
                routing.entry(name).or_default().push(other);
            }
        }
    }

    apply_slots(&mut dst, &mut routing, &overriding_names, mode, diagnostics);
    dst
}

fn contains_slot_named(el: &Element, name: &str) -> bool {
    el.children.iter().any(|child| match child {
        Node::Element(e) if e.tag == ":slot" => e.attr_str("name") == Some(name),
        Node::Element(e) => contains_slot_named(e, name),
        _ => false,
    })
}

/// Rewrites `el`'s children, splicing routed content into each `:slot`
/// marker found anywhere in the (pre-existing, un-spliced) structure and
/// then either dropping or keeping the marker per `mode`. Never descends
/// into freshly-spliced content: it belongs to the use-site, not to the
/// macro body being stamped, so it is not itself a slot target here.
fn apply_slots(
    el: &mut Element,
    routing: &mut HashMap<String, Vec<Node>>,
    overriding_names: &HashSet<String>,
    mode: StampMode,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let old_children = std::mem::take(&mut el.children);
    let mut new_children = Vec::with_capacity(old_children.len());

    for child in old_children {
        match child {
            Node::Element(e) if e.tag == ":slot" => {
                let name = match e.attr_str("name") {
                    Some(n) if !n.is_empty() => Some(n.to_string()),
                    _ => {
                        diagnostics.push(Diagnostic::error(Kind::Directive, "slot missing name attribute").with_span(e.span));
                        None
                    }
                };

                let Some(name) = name else { continue };

                if let Some(nodes) = routing.remove(&name) {
                    new_children.extend(nodes);
                }

                let keep_marker = mode == StampMode::Inherit && !overriding_names.contains(&name);
                if keep_marker {
                    new_children.push(Node::Element(e));
                }
            }
            Node::Element(mut e) => {
                apply_slots(&mut e, routing, overriding_names, mode, diagnostics);
                new_children.push(Node::Element(e));
            }
            other => new_children.push(other),
        }
    }

    el.children = new_children;
}

/// Runs the post-inclusion expansion pass over the whole consolidated
/// tree. `root` may itself be a macro use (an entry page rooted at a
/// custom element is legal, if unusual).
pub fn expand_tree(
    root: Element,
    macros: &HashMap<String, MacroDescriptor>,
    diagnostics: &mut Vec<Diagnostic>,
    max_nesting: usize,
) -> Element {
    if macros.contains_key(&root.tag) {
        expand_use_site(root, macros, diagnostics, max_nesting, 0)
    } else {
        let mut root = root;
        expand_children(&mut root, macros, diagnostics, max_nesting, 0);
        root
    }
}

fn expand_children(
    parent: &mut Element,
    macros: &HashMap<String, MacroDescriptor>,
    diagnostics: &mut Vec<Diagnostic>,
    max_nesting: usize,
    depth: usize,
) {
    let old_children = std::mem::take(&mut parent.children);
    let mut new_children = Vec::with_capacity(old_children.len());

    for child in old_children {
        match child {
            Node::Element(e) if macros.contains_key(&e.tag) => {
                new_children.push(Node::Element(expand_use_site(e, macros, diagnostics, max_nesting, depth)));
            }
            Node::Element(mut e) => {
                expand_children(&mut e, macros, diagnostics, max_nesting, depth);
                new_children.push(Node::Element(e));
            }
            other => new_children.push(other),
        }
    }

    parent.children = new_children;
}

fn expand_use_site(
    use_site: Element,
    macros: &HashMap<String, MacroDescriptor>,
    diagnostics: &mut Vec<Diagnostic>,
    max_nesting: usize,
    depth: usize,
) -> Element {
    if depth > max_nesting {
        diagnostics.push(
            Diagnostic::error(Kind::Depth, format!("too many nested macros \"{}\"", use_site.tag)).with_span(use_site.span),
        );
        return use_site;
    }

    let descriptor = match macros.get(&use_site.tag) {
        Some(d) => d.clone(),
        None => return use_site,
    };
    let span = use_site.span;
    let mut result = stamp(&descriptor, &use_site.attrs, use_site.children, StampMode::Final, span, diagnostics);
    expand_children(&mut result, macros, diagnostics, max_nesting, depth + 1);
    result
}
