#![forbid(unsafe_code)]

//! Platform capability surface for Anteroom.
//!
//! The dialog core never talks to a rendering engine directly. Everything it
//! needs from the host platform is expressed by the [`DomSurface`] trait:
//! tree traversal, attribute access, focus control, listener subscription,
//! and custom-event dispatch. A browser backend implements this over real
//! elements; [`fake::FakeDom`] implements it in memory so the core is fully
//! testable without one.
//!
//! All methods take `&self`. Implementations are expected to use interior
//! mutability, the way real DOM handles do: a `focus()` call may synchronously
//! re-enter listener dispatch, so exclusive borrows must never be held across
//! listener invocation.

pub mod event;
pub mod fake;

use event::{DomEvent, EventKind, Listener, ListenerPhase, ListenerTarget};

/// Opaque handle to a platform element.
///
/// Handles are cheap to copy and never dangle: operations on a node that has
/// been removed from the tree are no-ops or return empty results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value, for logging and diagnostics.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Injected platform surface.
///
/// # Invariants
///
/// - `descendants` returns pre-order (document-order) traversal, the order
///   native tab traversal follows absent explicit tab-index overrides.
/// - `remove_listener` removes exactly the instance that was added (compared
///   by `Rc::ptr_eq`), never another subscriber's callback.
/// - `focus` synchronously delivers a focus event to capture listeners on
///   the document and body before returning.
pub trait DomSurface {
    /// The document root node.
    fn document(&self) -> NodeId;

    /// The document body node.
    fn body(&self) -> NodeId;

    /// Parent of `node`, if attached.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// All descendants of `node` in pre-order, excluding `node` itself.
    fn descendants(&self, node: NodeId) -> Vec<NodeId>;

    /// Whether `node` is `ancestor` itself or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Lower-case tag name of `node`.
    fn tag_name(&self, node: NodeId) -> String;

    /// Attribute value, `None` when absent.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&self, node: NodeId, name: &str);

    /// Rendered width and height. Both zero for layout-hidden elements.
    fn rendered_extent(&self, node: NodeId) -> (u32, u32);

    /// Whether the element contributes any client bounding rectangles.
    fn has_client_rects(&self, node: NodeId) -> bool;

    /// The element currently holding keyboard focus.
    fn active_element(&self) -> Option<NodeId>;

    /// Whether `node` can currently receive programmatic focus.
    fn can_focus(&self, node: NodeId) -> bool;

    /// Move keyboard focus to `node`. No-op if the node cannot take focus.
    fn focus(&self, node: NodeId);

    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: ListenerPhase,
        listener: &Listener,
    );

    fn remove_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: ListenerPhase,
        listener: &Listener,
    );

    /// Dispatch a named custom event on `target` for external observers,
    /// carrying `detail` as its payload.
    fn dispatch_custom(&self, target: NodeId, name: &str, detail: Option<DomEvent>);
}

/// Walk from `node` up through its ancestors, returning the first node
/// matching `pred`. Includes `node` itself, like `Element.closest`.
pub fn closest<D: DomSurface + ?Sized>(
    dom: &D,
    node: NodeId,
    mut pred: impl FnMut(NodeId) -> bool,
) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(n) = current {
        if pred(n) {
            return Some(n);
        }
        current = dom.parent(n);
    }
    None
}
