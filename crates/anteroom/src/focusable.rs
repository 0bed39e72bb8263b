#![forbid(unsafe_code)]

//! Scanner producing the ordered sequence of focusable elements inside a
//! container.
//!
//! The "can receive focus" rules are a fixed configuration table, not
//! computed logic. The sequence is recomputed on every call and must never
//! be cached: visibility and tree structure can change between two Tab
//! presses, and the trap has to see the live document.

use anteroom_dom::{DomSurface, NodeId};

/// One selector rule from the focusable-element table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRule {
    tag: Option<&'static str>,
    requires_attr: Option<&'static str>,
}

impl FocusRule {
    /// Match any element with this tag name.
    pub const fn tag(tag: &'static str) -> Self {
        Self {
            tag: Some(tag),
            requires_attr: None,
        }
    }

    /// Match elements with this tag name carrying an attribute.
    pub const fn tag_with_attr(tag: &'static str, attr: &'static str) -> Self {
        Self {
            tag: Some(tag),
            requires_attr: Some(attr),
        }
    }

    /// Match any element carrying an attribute, regardless of tag.
    pub const fn attr(attr: &'static str) -> Self {
        Self {
            tag: None,
            requires_attr: Some(attr),
        }
    }

    /// Whether `node` satisfies this rule.
    pub fn matches<D: DomSurface + ?Sized>(&self, dom: &D, node: NodeId) -> bool {
        if let Some(tag) = self.tag
            && !dom.tag_name(node).eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(attr) = self.requires_attr
            && dom.attribute(node, attr).is_none()
        {
            return false;
        }
        true
    }
}

/// Elements eligible to receive keyboard focus.
///
/// Form controls, links with a destination, embedded frames, media with
/// controls, editable regions, and anything with an explicit tab index.
/// Global exclusions (negative tab index, `disabled`, hidden inputs) are
/// applied on top by [`focusable_children`].
pub const FOCUSABLE_RULES: &[FocusRule] = &[
    FocusRule::tag_with_attr("a", "href"),
    FocusRule::tag_with_attr("area", "href"),
    FocusRule::tag("input"),
    FocusRule::tag("select"),
    FocusRule::tag("textarea"),
    FocusRule::tag("button"),
    FocusRule::tag("iframe"),
    FocusRule::tag_with_attr("audio", "controls"),
    FocusRule::tag_with_attr("video", "controls"),
    FocusRule::attr("contenteditable"),
    FocusRule::attr("tabindex"),
];

/// The live, document-ordered sequence of focusable descendants of `node`.
///
/// Order is pre-order traversal order, which native tab order follows in
/// the absence of explicit tab-index overrides. Elements matching the rule
/// table are dropped again when they are excluded outright or hidden via
/// layout (zero rendered extent and no client rects).
pub fn focusable_children<D: DomSurface + ?Sized>(dom: &D, node: NodeId) -> Vec<NodeId> {
    dom.descendants(node)
        .into_iter()
        .filter(|&n| FOCUSABLE_RULES.iter().any(|rule| rule.matches(dom, n)))
        .filter(|&n| !excluded(dom, n))
        .filter(|&n| is_rendered(dom, n))
        .collect()
}

fn excluded<D: DomSurface + ?Sized>(dom: &D, node: NodeId) -> bool {
    if dom
        .attribute(node, "tabindex")
        .is_some_and(|t| t.starts_with('-'))
    {
        return true;
    }
    if dom.attribute(node, "disabled").is_some() {
        return true;
    }
    dom.tag_name(node).eq_ignore_ascii_case("input")
        && dom
            .attribute(node, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
}

fn is_rendered<D: DomSurface + ?Sized>(dom: &D, node: NodeId) -> bool {
    let (width, height) = dom.rendered_extent(node);
    width != 0 || height != 0 || dom.has_client_rects(node)
}
