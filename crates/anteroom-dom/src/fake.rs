#![forbid(unsafe_code)]

//! In-memory [`DomSurface`] implementation.
//!
//! `FakeDom` models just enough of a document for the dialog core: an
//! element tree with attributes, layout extents, an active (focused)
//! element, a listener registry, and a log of dispatched custom events.
//! It also simulates the platform's *default* Tab action: when no keydown
//! listener prevents it, focus advances through the document's native tab
//! order, so "leave interior Tab presses to the platform" is observable
//! in tests.
//!
//! # Failure modes
//!
//! - Operations on removed nodes are no-ops (`focus`, `set_attribute`) or
//!   return empty results (`descendants`, `attribute`). Nothing panics.
//! - Focusing the already-active element does not re-fire focus events,
//!   matching platform behavior and bounding re-entrant dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;

use crate::event::{DomEvent, EventKind, Key, Listener, ListenerPhase, ListenerTarget, Modifiers};
use crate::{DomSurface, NodeId};

struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: AHashMap<String, String>,
    extent: (u32, u32),
    client_rects: bool,
    removed: bool,
}

impl NodeData {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent,
            children: Vec::new(),
            attributes: AHashMap::new(),
            // Elements are rendered by default; tests opt out per node.
            extent: (1, 1),
            client_rects: true,
            removed: false,
        }
    }
}

struct ListenerEntry {
    target: ListenerTarget,
    kind: EventKind,
    phase: ListenerPhase,
    listener: Listener,
}

/// A custom event recorded by [`DomSurface::dispatch_custom`].
///
/// The payload is wrapped under `detail`, the convention external tooling
/// observes.
#[derive(Debug, Clone)]
pub struct CustomEventRecord {
    pub target: NodeId,
    pub name: String,
    pub detail: Option<DomEvent>,
}

/// In-memory document tree implementing [`DomSurface`].
pub struct FakeDom {
    nodes: RefCell<Vec<NodeData>>,
    document: NodeId,
    body: NodeId,
    active: Cell<Option<NodeId>>,
    listeners: RefCell<Vec<ListenerEntry>>,
    custom_events: RefCell<Vec<CustomEventRecord>>,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    /// Create a document with an empty body.
    pub fn new() -> Self {
        let document = NodeId::new(0);
        let body = NodeId::new(1);
        let mut document_node = NodeData::new("#document", None);
        document_node.children.push(body);
        let nodes = vec![document_node, NodeData::new("body", Some(document))];
        Self {
            nodes: RefCell::new(nodes),
            document,
            body,
            active: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
            custom_events: RefCell::new(Vec::new()),
        }
    }

    fn index(node: NodeId) -> usize {
        node.raw() as usize
    }

    fn exists(&self, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        Self::index(node) < nodes.len() && !nodes[Self::index(node)].removed
    }

    // --- Tree construction ---

    /// Create a detached element. Attach it with [`FakeDom::append_child`].
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId::new(nodes.len() as u64);
        nodes.push(NodeData::new(tag, None));
        id
    }

    /// Create an element and append it to `parent` in one step.
    pub fn create_in(&self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_element(tag);
        self.append_child(parent, node);
        node
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        if !self.exists(parent) || !self.exists(child) {
            return;
        }
        let mut nodes = self.nodes.borrow_mut();
        nodes[Self::index(child)].parent = Some(parent);
        nodes[Self::index(parent)].children.push(child);
    }

    /// Detach `node` (and implicitly its subtree) from the document.
    /// A removed node can no longer receive focus; if it held focus, focus
    /// is cleared.
    pub fn remove_node(&self, node: NodeId) {
        if !self.exists(node) {
            return;
        }
        {
            let mut nodes = self.nodes.borrow_mut();
            if let Some(parent) = nodes[Self::index(node)].parent {
                let siblings = &mut nodes[Self::index(parent)].children;
                siblings.retain(|&c| c != node);
            }
            nodes[Self::index(node)].removed = true;
        }
        if let Some(active) = self.active.get()
            && self.contains(node, active)
        {
            self.active.set(None);
        }
    }

    // --- Layout control ---

    /// Set the rendered width and height reported for `node`.
    pub fn set_extent(&self, node: NodeId, width: u32, height: u32) {
        if self.exists(node) {
            self.nodes.borrow_mut()[Self::index(node)].extent = (width, height);
        }
    }

    /// Set whether `node` reports client bounding rectangles.
    pub fn set_client_rects(&self, node: NodeId, present: bool) {
        if self.exists(node) {
            self.nodes.borrow_mut()[Self::index(node)].client_rects = present;
        }
    }

    /// Mark `node` as rendered or layout-hidden in one step.
    pub fn set_rendered(&self, node: NodeId, rendered: bool) {
        if rendered {
            self.set_extent(node, 1, 1);
            self.set_client_rects(node, true);
        } else {
            self.set_extent(node, 0, 0);
            self.set_client_rects(node, false);
        }
    }

    // --- Introspection for tests ---

    /// Number of listeners currently attached to `target` for `kind`.
    pub fn listener_count(&self, target: ListenerTarget, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|e| e.target == target && e.kind == kind)
            .count()
    }

    /// All custom events dispatched so far, oldest first.
    pub fn custom_events(&self) -> Vec<CustomEventRecord> {
        self.custom_events.borrow().clone()
    }

    /// Drain the custom-event log.
    pub fn take_custom_events(&self) -> Vec<CustomEventRecord> {
        std::mem::take(&mut *self.custom_events.borrow_mut())
    }

    // --- Event synthesis ---

    /// Deliver a keydown for the current active element, then run the
    /// platform default action if no listener prevented it. Returns the
    /// event so callers can inspect `default_prevented`.
    pub fn press_key(&self, key: Key, modifiers: Modifiers) -> DomEvent {
        let target = self.active.get();
        let event = DomEvent::keydown(key, modifiers, target);
        self.dispatch(&event, target);
        if key == Key::Tab && !event.default_prevented() {
            self.native_tab(modifiers.contains(Modifiers::SHIFT));
        }
        event
    }

    /// Deliver a click on `node` to its listeners. Returns the event.
    pub fn click(&self, node: NodeId) -> DomEvent {
        let event = DomEvent::click(node);
        self.dispatch(&event, Some(node));
        event
    }

    /// Snapshot the listeners relevant to `event`, capture phase first,
    /// then invoke them without holding any interior borrow.
    fn dispatch(&self, event: &DomEvent, target: Option<NodeId>) {
        let relevant = |entry: &ListenerEntry| {
            if entry.kind != event.kind {
                return false;
            }
            match entry.target {
                ListenerTarget::Document | ListenerTarget::Body => true,
                ListenerTarget::Node(n) => Some(n) == target,
            }
        };
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.borrow();
            let capture = listeners
                .iter()
                .filter(|e| relevant(e) && e.phase == ListenerPhase::Capture);
            let bubble = listeners
                .iter()
                .filter(|e| relevant(e) && e.phase == ListenerPhase::Bubble);
            capture.chain(bubble).map(|e| e.listener.clone()).collect()
        };
        for listener in snapshot {
            listener(event);
        }
    }

    /// The platform's native Tab traversal: advance focus to the next (or
    /// previous) natively focusable element in document order. The scan
    /// starts from the active element's *document* position even when that
    /// element is not itself a tab stop (e.g. a `tabindex="-1"` container),
    /// the way real traversal continues past the focused element.
    fn native_tab(&self, backward: bool) {
        let all = self.descendants(self.document);
        let focusable: Vec<NodeId> = all
            .iter()
            .copied()
            .filter(|&n| self.natively_focusable(n))
            .collect();
        if focusable.is_empty() {
            return;
        }
        let first = focusable[0];
        let last = focusable[focusable.len() - 1];
        let anchor = self
            .active
            .get()
            .and_then(|active| all.iter().position(|&n| n == active));
        let next = match anchor {
            None => {
                if backward {
                    last
                } else {
                    first
                }
            }
            Some(position) if backward => all[..position]
                .iter()
                .rev()
                .copied()
                .find(|&n| self.natively_focusable(n))
                .unwrap_or(last),
            Some(position) => all[position + 1..]
                .iter()
                .copied()
                .find(|&n| self.natively_focusable(n))
                .unwrap_or(first),
        };
        self.focus(next);
    }

    /// The platform's own notion of focusability, used only for the default
    /// Tab action. Dialog code applies its own rule table instead.
    fn natively_focusable(&self, node: NodeId) -> bool {
        if !self.exists(node) {
            return false;
        }
        let (w, h) = self.rendered_extent(node);
        if w == 0 && h == 0 && !self.has_client_rects(node) {
            return false;
        }
        if self
            .attribute(node, "tabindex")
            .is_some_and(|t| t.starts_with('-'))
        {
            return false;
        }
        if self.attribute(node, "disabled").is_some() {
            return false;
        }
        let tag = self.tag_name(node);
        match tag.as_str() {
            "input" => !self
                .attribute(node, "type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
            "select" | "textarea" | "button" | "iframe" => true,
            "a" | "area" => self.attribute(node, "href").is_some(),
            _ => {
                self.attribute(node, "tabindex").is_some()
                    || self.attribute(node, "contenteditable").is_some()
            }
        }
    }

    fn collect_preorder(&self, node: NodeId, out: &mut Vec<NodeId>) {
        let children = {
            let nodes = self.nodes.borrow();
            nodes[Self::index(node)].children.clone()
        };
        for child in children {
            if !self.exists(child) {
                continue;
            }
            out.push(child);
            self.collect_preorder(child, out);
        }
    }
}

impl DomSurface for FakeDom {
    fn document(&self) -> NodeId {
        self.document
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        if !self.exists(node) {
            return None;
        }
        self.nodes.borrow()[Self::index(node)].parent
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        if !self.exists(node) {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.collect_preorder(node, &mut out);
        out
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    fn tag_name(&self, node: NodeId) -> String {
        if !self.exists(node) {
            return String::new();
        }
        self.nodes.borrow()[Self::index(node)].tag.clone()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        if !self.exists(node) {
            return None;
        }
        self.nodes.borrow()[Self::index(node)]
            .attributes
            .get(name)
            .cloned()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if self.exists(node) {
            self.nodes.borrow_mut()[Self::index(node)]
                .attributes
                .insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if self.exists(node) {
            self.nodes.borrow_mut()[Self::index(node)]
                .attributes
                .remove(name);
        }
    }

    fn rendered_extent(&self, node: NodeId) -> (u32, u32) {
        if !self.exists(node) {
            return (0, 0);
        }
        self.nodes.borrow()[Self::index(node)].extent
    }

    fn has_client_rects(&self, node: NodeId) -> bool {
        self.exists(node) && self.nodes.borrow()[Self::index(node)].client_rects
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active.get()
    }

    fn can_focus(&self, node: NodeId) -> bool {
        self.exists(node) && self.contains(self.document, node)
    }

    fn focus(&self, node: NodeId) {
        if !self.can_focus(node) || self.active.get() == Some(node) {
            return;
        }
        self.active.set(Some(node));
        let event = DomEvent::focus(node);
        self.dispatch(&event, Some(node));
    }

    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: ListenerPhase,
        listener: &Listener,
    ) {
        self.listeners.borrow_mut().push(ListenerEntry {
            target,
            kind,
            phase,
            listener: listener.clone(),
        });
    }

    fn remove_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: ListenerPhase,
        listener: &Listener,
    ) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(position) = listeners.iter().position(|e| {
            e.target == target
                && e.kind == kind
                && e.phase == phase
                && Rc::ptr_eq(&e.listener, listener)
        }) {
            listeners.remove(position);
        }
    }

    fn dispatch_custom(&self, target: NodeId, name: &str, detail: Option<DomEvent>) {
        self.custom_events.borrow_mut().push(CustomEventRecord {
            target,
            name: name.to_owned(),
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    #[test]
    fn descendants_are_preorder() {
        let dom = FakeDom::new();
        let a = dom.create_in(dom.body(), "div");
        let a1 = dom.create_in(a, "span");
        let a2 = dom.create_in(a, "span");
        let b = dom.create_in(dom.body(), "div");

        assert_eq!(dom.descendants(dom.body()), vec![a, a1, a2, b]);
    }

    #[test]
    fn contains_includes_self() {
        let dom = FakeDom::new();
        let a = dom.create_in(dom.body(), "div");
        assert!(dom.contains(a, a));
        assert!(dom.contains(dom.body(), a));
        assert!(!dom.contains(a, dom.body()));
    }

    #[test]
    fn removed_node_is_unfocusable_and_invisible_to_traversal() {
        let dom = FakeDom::new();
        let a = dom.create_in(dom.body(), "button");
        dom.focus(a);
        assert_eq!(dom.active_element(), Some(a));

        dom.remove_node(a);
        assert!(!dom.can_focus(a));
        assert_eq!(dom.active_element(), None);
        assert!(dom.descendants(dom.body()).is_empty());

        dom.focus(a);
        assert_eq!(dom.active_element(), None);
    }

    #[test]
    fn focus_fires_capture_listeners_on_body() {
        let dom = FakeDom::new();
        let a = dom.create_in(dom.body(), "button");
        let seen: Rc<StdRefCell<Vec<Option<NodeId>>>> = Rc::new(StdRefCell::new(Vec::new()));

        let listener: Listener = {
            let seen = seen.clone();
            Rc::new(move |event: &DomEvent| seen.borrow_mut().push(event.target))
        };
        dom.add_listener(
            ListenerTarget::Body,
            EventKind::Focus,
            ListenerPhase::Capture,
            &listener,
        );

        dom.focus(a);
        assert_eq!(seen.borrow().as_slice(), &[Some(a)]);

        // Refocusing the active element fires nothing.
        dom.focus(a);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn remove_listener_targets_exact_instance() {
        let dom = FakeDom::new();
        let first: Listener = Rc::new(|_| {});
        let second: Listener = Rc::new(|_| {});
        dom.add_listener(
            ListenerTarget::Document,
            EventKind::Keydown,
            ListenerPhase::Bubble,
            &first,
        );
        dom.add_listener(
            ListenerTarget::Document,
            EventKind::Keydown,
            ListenerPhase::Bubble,
            &second,
        );
        assert_eq!(dom.listener_count(ListenerTarget::Document, EventKind::Keydown), 2);

        dom.remove_listener(
            ListenerTarget::Document,
            EventKind::Keydown,
            ListenerPhase::Bubble,
            &second,
        );
        assert_eq!(dom.listener_count(ListenerTarget::Document, EventKind::Keydown), 1);

        // Removing an instance that is no longer attached is a no-op.
        dom.remove_listener(
            ListenerTarget::Document,
            EventKind::Keydown,
            ListenerPhase::Bubble,
            &second,
        );
        assert_eq!(dom.listener_count(ListenerTarget::Document, EventKind::Keydown), 1);
    }

    #[test]
    fn native_tab_walks_document_order() {
        let dom = FakeDom::new();
        let a = dom.create_in(dom.body(), "button");
        let b = dom.create_in(dom.body(), "button");
        let c = dom.create_in(dom.body(), "button");

        dom.focus(a);
        dom.press_key(Key::Tab, Modifiers::empty());
        assert_eq!(dom.active_element(), Some(b));
        dom.press_key(Key::Tab, Modifiers::empty());
        assert_eq!(dom.active_element(), Some(c));
        dom.press_key(Key::Tab, Modifiers::SHIFT);
        assert_eq!(dom.active_element(), Some(b));
    }

    #[test]
    fn prevented_tab_skips_default_traversal() {
        let dom = FakeDom::new();
        let a = dom.create_in(dom.body(), "button");
        let _b = dom.create_in(dom.body(), "button");
        dom.focus(a);

        let listener: Listener = Rc::new(|event: &DomEvent| event.prevent_default());
        dom.add_listener(
            ListenerTarget::Document,
            EventKind::Keydown,
            ListenerPhase::Bubble,
            &listener,
        );

        let event = dom.press_key(Key::Tab, Modifiers::empty());
        assert!(event.default_prevented());
        assert_eq!(dom.active_element(), Some(a));
    }

    #[test]
    fn native_tab_skips_hidden_disabled_and_negative_tabindex() {
        let dom = FakeDom::new();
        let a = dom.create_in(dom.body(), "button");
        let hidden = dom.create_in(dom.body(), "button");
        dom.set_rendered(hidden, false);
        let disabled = dom.create_in(dom.body(), "button");
        dom.set_attribute(disabled, "disabled", "");
        let negative = dom.create_in(dom.body(), "button");
        dom.set_attribute(negative, "tabindex", "-1");
        let b = dom.create_in(dom.body(), "button");

        dom.focus(a);
        dom.press_key(Key::Tab, Modifiers::empty());
        assert_eq!(dom.active_element(), Some(b));
    }

    #[test]
    fn custom_events_are_recorded_in_order() {
        let dom = FakeDom::new();
        let el = dom.create_in(dom.body(), "div");
        dom.dispatch_custom(el, "show", None);
        dom.dispatch_custom(el, "hide", None);

        let log = dom.take_custom_events();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].name, "show");
        assert_eq!(log[1].name, "hide");
        assert!(dom.custom_events().is_empty());
    }

    #[test]
    fn click_reaches_node_and_document_listeners() {
        let dom = FakeDom::new();
        let button = dom.create_in(dom.body(), "button");
        let other = dom.create_in(dom.body(), "button");
        let hits = Rc::new(Cell::new(0u32));

        let listener: Listener = {
            let hits = hits.clone();
            Rc::new(move |_| hits.set(hits.get() + 1))
        };
        dom.add_listener(
            ListenerTarget::Node(button),
            EventKind::Click,
            ListenerPhase::Bubble,
            &listener,
        );

        dom.click(button);
        assert_eq!(hits.get(), 1);
        dom.click(other);
        assert_eq!(hits.get(), 1);
    }
}
