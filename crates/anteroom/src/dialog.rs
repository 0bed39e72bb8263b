#![forbid(unsafe_code)]

//! The dialog controller state machine.
//!
//! One [`Dialog`] owns one container element for its lifetime and is the
//! exclusive mutator of that element's `aria-hidden`, `aria-modal`, `role`
//! and `tabindex` attributes.
//!
//! # Invariants
//!
//! - `shown` is true iff `aria-hidden` is absent from the element iff the
//!   document keydown and body focus-monitor listeners are installed.
//! - Lifecycle events fire exactly once per real transition; repeated
//!   show/hide calls are silent no-ops.
//! - Listener identities are prebound at construction and reused across
//!   every show/hide cycle, so removal always detaches the exact instance
//!   that was added.
//!
//! # Failure modes
//!
//! There is no error surface: invalid usage (show while shown, off with an
//! unregistered handler, restoring focus to a vanished element) is a
//! silent no-op, never a panic. Misbehavior would show up as state
//! divergence, which the invariants above and the tests pin down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use anteroom_dom::event::{DomEvent, EventKind, Key, Listener, ListenerPhase, ListenerTarget};
use anteroom_dom::{DomSurface, NodeId, closest};

use crate::events::{DialogEvent, DialogHandler, HandlerRegistry};
use crate::trap::trap_tab_key;

/// Marks an element as an auto-instantiable dialog and optionally carries
/// its identifier.
pub const DIALOG_ATTR: &str = "data-dialog";
/// Marks a trigger element that opens the dialog whose identifier matches
/// the attribute value.
pub const SHOW_ATTR: &str = "data-dialog-show";
/// Marks a trigger element that closes a dialog: inside a dialog any value
/// targets that dialog, elsewhere the value names the target.
pub const HIDE_ATTR: &str = "data-dialog-hide";
/// Marks a region exempt from the focus trap, allowing intentional focus
/// excursions (e.g. an always-visible toolbar).
pub const IGNORE_FOCUS_TRAP_ATTR: &str = "data-dialog-ignore-focus-trap";

struct Inner<D: DomSurface> {
    dom: Rc<D>,
    element: NodeId,
    id: String,
    shown: bool,
    destroyed: bool,
    previously_focused: Option<NodeId>,
    openers: Vec<NodeId>,
    closers: Vec<NodeId>,
    handlers: HandlerRegistry,
    // Prebound listener identities, created once at construction.
    keydown: Option<Listener>,
    focus_monitor: Option<Listener>,
    opener_click: Option<Listener>,
    closer_click: Option<Listener>,
}

/// Accessible modal-dialog controller.
///
/// Cheap to clone; clones share the same underlying state, which is what
/// lets the document-level listeners and the public API converge on one
/// state machine.
pub struct Dialog<D: DomSurface + 'static> {
    inner: Rc<RefCell<Inner<D>>>,
}

impl<D: DomSurface + 'static> Clone for Dialog<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: DomSurface + 'static> Dialog<D> {
    /// Wrap `element` with a controller.
    ///
    /// Applies the accessibility attribute contract (`aria-hidden="true"`,
    /// `aria-modal="true"`, `tabindex="-1"`, and `role="dialog"` unless a
    /// role is already present), discovers opener/closer triggers by
    /// identifier, wires their click listeners, and fires `create` on the
    /// native channel.
    pub fn new(dom: Rc<D>, element: NodeId) -> Self {
        let id = dom
            .attribute(element, DIALOG_ATTR)
            .filter(|v| !v.is_empty())
            .or_else(|| dom.attribute(element, "id"))
            .unwrap_or_default();

        dom.set_attribute(element, "aria-hidden", "true");
        dom.set_attribute(element, "aria-modal", "true");
        dom.set_attribute(element, "tabindex", "-1");
        if dom.attribute(element, "role").is_none() {
            dom.set_attribute(element, "role", "dialog");
        }

        let openers = collect_openers(&*dom, &id);
        let closers = collect_closers(&*dom, element, &id);

        let inner = Rc::new(RefCell::new(Inner {
            dom: dom.clone(),
            element,
            id,
            shown: false,
            destroyed: false,
            previously_focused: None,
            openers: openers.clone(),
            closers: closers.clone(),
            handlers: HandlerRegistry::new(),
            keydown: None,
            focus_monitor: None,
            opener_click: None,
            closer_click: None,
        }));

        let keydown = prebind(&inner, on_keydown);
        let focus_monitor = prebind(&inner, on_focus);
        let opener_click = prebind(&inner, |rc, event| show_impl(rc, Some(event)));
        let closer_click = prebind(&inner, |rc, event| hide_impl(rc, Some(event)));

        for &node in &openers {
            dom.add_listener(
                ListenerTarget::Node(node),
                EventKind::Click,
                ListenerPhase::Bubble,
                &opener_click,
            );
        }
        for &node in &closers {
            dom.add_listener(
                ListenerTarget::Node(node),
                EventKind::Click,
                ListenerPhase::Bubble,
                &closer_click,
            );
        }

        {
            let mut state = inner.borrow_mut();
            state.keydown = Some(keydown);
            state.focus_monitor = Some(focus_monitor);
            state.opener_click = Some(opener_click);
            state.closer_click = Some(closer_click);
        }

        fire(&inner, DialogEvent::Create, None);
        Self { inner }
    }

    /// Open the dialog. No-op if already shown or destroyed.
    pub fn show(&self) -> &Self {
        show_impl(&self.inner, None);
        self
    }

    /// Open the dialog, carrying the triggering input event as the `show`
    /// payload.
    pub fn show_with(&self, event: &DomEvent) -> &Self {
        show_impl(&self.inner, Some(event));
        self
    }

    /// Close the dialog. No-op if already hidden.
    pub fn hide(&self) -> &Self {
        hide_impl(&self.inner, None);
        self
    }

    /// Close the dialog, carrying the triggering input event as the `hide`
    /// payload.
    pub fn hide_with(&self, event: &DomEvent) -> &Self {
        hide_impl(&self.inner, Some(event));
        self
    }

    /// Hide if needed, detach every trigger listener, fire `destroy`, and
    /// clear all registered handlers. The instance stays inert afterwards:
    /// further calls are no-ops and events are silently dropped.
    pub fn destroy(&self) -> &Self {
        destroy_impl(&self.inner);
        self
    }

    /// Register a lifecycle handler. Handlers run in registration order;
    /// duplicates are allowed.
    pub fn on(&self, event: DialogEvent, handler: DialogHandler) -> &Self {
        let mut state = self.inner.borrow_mut();
        if !state.destroyed {
            state.handlers.on(event, handler);
        }
        drop(state);
        self
    }

    /// Remove the first registration of `handler`, matched by identity.
    pub fn off(&self, event: DialogEvent, handler: &DialogHandler) -> &Self {
        self.inner.borrow_mut().handlers.off(event, handler);
        self
    }

    /// Whether the dialog is currently open.
    pub fn shown(&self) -> bool {
        self.inner.borrow().shown
    }

    /// The wrapped container element.
    pub fn element(&self) -> NodeId {
        self.inner.borrow().element
    }

    /// The identifier openers and closers are matched against.
    pub fn id(&self) -> String {
        self.inner.borrow().id.clone()
    }
}

/// Build a listener that routes back into the controller through a weak
/// reference. Keeping only a `Weak` here means the document's listener
/// registry never keeps a destroyed controller alive.
fn prebind<D: DomSurface + 'static>(
    inner: &Rc<RefCell<Inner<D>>>,
    route: impl Fn(&Rc<RefCell<Inner<D>>>, &DomEvent) + 'static,
) -> Listener {
    let weak: Weak<RefCell<Inner<D>>> = Rc::downgrade(inner);
    Rc::new(move |event: &DomEvent| {
        if let Some(rc) = weak.upgrade() {
            route(&rc, event);
        }
    })
}

fn collect_openers<D: DomSurface + ?Sized>(dom: &D, id: &str) -> Vec<NodeId> {
    dom.descendants(dom.document())
        .into_iter()
        .filter(|&n| dom.attribute(n, SHOW_ATTR).as_deref() == Some(id))
        .collect()
}

/// Closers are every descendant of the dialog carrying the hide attribute
/// (any value), plus every document element targeting this dialog's
/// identifier. First occurrence wins so no trigger gets two listeners.
fn collect_closers<D: DomSurface + ?Sized>(dom: &D, element: NodeId, id: &str) -> Vec<NodeId> {
    let mut closers: Vec<NodeId> = dom
        .descendants(element)
        .into_iter()
        .filter(|&n| dom.attribute(n, HIDE_ATTR).is_some())
        .collect();
    for node in dom.descendants(dom.document()) {
        if dom.attribute(node, HIDE_ATTR).as_deref() == Some(id) && !closers.contains(&node) {
            closers.push(node);
        }
    }
    closers
}

fn show_impl<D: DomSurface + 'static>(inner: &Rc<RefCell<Inner<D>>>, event: Option<&DomEvent>) {
    let (dom, element) = {
        let mut state = inner.borrow_mut();
        if state.shown || state.destroyed {
            return;
        }
        state.shown = true;
        state.previously_focused = state.dom.active_element();
        state.dom.remove_attribute(state.element, "aria-hidden");
        (state.dom.clone(), state.element)
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(element = element.raw(), "dialog shown");

    // Focus moves in before the monitor is armed, so the entry itself is
    // not treated as an escape.
    move_focus_into(&*dom, element);

    {
        let state = inner.borrow();
        if let Some(listener) = &state.focus_monitor {
            dom.add_listener(
                ListenerTarget::Body,
                EventKind::Focus,
                ListenerPhase::Capture,
                listener,
            );
        }
        if let Some(listener) = &state.keydown {
            dom.add_listener(
                ListenerTarget::Document,
                EventKind::Keydown,
                ListenerPhase::Bubble,
                listener,
            );
        }
    }

    fire(inner, DialogEvent::Show, event);
}

fn hide_impl<D: DomSurface + 'static>(inner: &Rc<RefCell<Inner<D>>>, event: Option<&DomEvent>) {
    let (dom, element, previously_focused) = {
        let mut state = inner.borrow_mut();
        if !state.shown {
            return;
        }
        // State flips before the event fires so handlers observe the
        // final state.
        state.shown = false;
        state.dom.set_attribute(state.element, "aria-hidden", "true");
        (state.dom.clone(), state.element, state.previously_focused)
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(element = element.raw(), "dialog hidden");
    #[cfg(not(feature = "tracing"))]
    let _ = element;

    // The monitor is still installed here, but it checks `shown` and lets
    // the restoration through.
    if let Some(previous) = previously_focused
        && dom.can_focus(previous)
    {
        dom.focus(previous);
    }

    {
        let state = inner.borrow();
        if let Some(listener) = &state.focus_monitor {
            dom.remove_listener(
                ListenerTarget::Body,
                EventKind::Focus,
                ListenerPhase::Capture,
                listener,
            );
        }
        if let Some(listener) = &state.keydown {
            dom.remove_listener(
                ListenerTarget::Document,
                EventKind::Keydown,
                ListenerPhase::Bubble,
                listener,
            );
        }
    }

    fire(inner, DialogEvent::Hide, event);
}

fn destroy_impl<D: DomSurface + 'static>(inner: &Rc<RefCell<Inner<D>>>) {
    hide_impl(inner, None);

    {
        let state = inner.borrow();
        let dom = state.dom.clone();
        if let Some(listener) = &state.opener_click {
            for &node in &state.openers {
                dom.remove_listener(
                    ListenerTarget::Node(node),
                    EventKind::Click,
                    ListenerPhase::Bubble,
                    listener,
                );
            }
        }
        if let Some(listener) = &state.closer_click {
            for &node in &state.closers {
                dom.remove_listener(
                    ListenerTarget::Node(node),
                    EventKind::Click,
                    ListenerPhase::Bubble,
                    listener,
                );
            }
        }
    }

    fire(inner, DialogEvent::Destroy, None);

    let mut state = inner.borrow_mut();
    state.handlers.clear();
    state.destroyed = true;

    #[cfg(feature = "tracing")]
    tracing::debug!(element = state.element.raw(), "dialog destroyed");
}

/// Dual-delivery dispatch: the platform-native custom event goes out
/// first, then registered handlers run in registration order. Both sinks
/// run on every fire. Handlers are invoked with no interior borrow held,
/// so they may re-enter show/hide/on/off synchronously.
fn fire<D: DomSurface + 'static>(
    inner: &Rc<RefCell<Inner<D>>>,
    event: DialogEvent,
    payload: Option<&DomEvent>,
) {
    let (dom, element, handlers) = {
        let state = inner.borrow();
        (
            state.dom.clone(),
            state.element,
            state.handlers.snapshot(event),
        )
    };
    dom.dispatch_custom(element, event.name(), payload.cloned());
    for handler in handlers {
        handler(element, payload);
    }
}

/// Keydown routing. Global listener, per-controller filtering: only the
/// dialog containing the current focus reacts, which is what keeps nested
/// and stacked dialogs from answering each other's keys.
fn on_keydown<D: DomSurface + 'static>(inner: &Rc<RefCell<Inner<D>>>, event: &DomEvent) {
    let (dom, element, shown) = {
        let state = inner.borrow();
        (state.dom.clone(), state.element, state.shown)
    };
    let Some(active) = dom.active_element() else {
        return;
    };
    if !dom.contains(element, active) {
        return;
    }

    if shown
        && event.key == Some(Key::Escape)
        && dom.attribute(element, "role").as_deref() != Some("alertdialog")
    {
        event.prevent_default();
        hide_impl(inner, Some(event));
    }
    if shown && event.key == Some(Key::Tab) {
        trap_tab_key(&*dom, element, event);
    }
}

/// Capturing focus monitor. Focus landing outside every active modal
/// region and outside any explicitly exempt region is pulled back into
/// this dialog. Focus inside *any* `aria-modal` subtree is tolerated, so
/// legitimately stacked sibling dialogs do not fight over it.
fn on_focus<D: DomSurface + 'static>(inner: &Rc<RefCell<Inner<D>>>, event: &DomEvent) {
    let (dom, element, shown) = {
        let state = inner.borrow();
        (state.dom.clone(), state.element, state.shown)
    };
    if !shown {
        return;
    }
    let Some(target) = event.target else {
        return;
    };

    let in_modal_region = closest(&*dom, target, |n| {
        dom.attribute(n, "aria-modal").as_deref() == Some("true")
    })
    .is_some();
    let exempt = closest(&*dom, target, |n| {
        dom.attribute(n, IGNORE_FOCUS_TRAP_ATTR).is_some()
    })
    .is_some();

    if !in_modal_region && !exempt {
        move_focus_into(&*dom, element);
    }
}

/// Focus-entry policy: the first descendant carrying `autofocus` if one
/// exists, otherwise the container itself (focusable via its programmatic
/// tab index).
fn move_focus_into<D: DomSurface + ?Sized>(dom: &D, element: NodeId) {
    let target = dom
        .descendants(element)
        .into_iter()
        .find(|&n| dom.attribute(n, "autofocus").is_some())
        .unwrap_or(element);
    dom.focus(target);
}
