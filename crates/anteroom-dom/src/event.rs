#![forbid(unsafe_code)]

//! Platform event model: keys, modifiers, listener plumbing.
//!
//! Events are single-threaded values handed to listeners synchronously.
//! `DomEvent` clones share the same `default_prevented` flag so a dispatcher
//! observes prevention performed by any listener it invoked.

use std::cell::Cell;
use std::rc::Rc;

use crate::NodeId;

bitflags::bitflags! {
    /// Keyboard modifier state carried by a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
    }
}

/// Key identity for keydown events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Tab,
    Enter,
    Char(char),
}

/// Kinds of platform events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Keydown,
    Focus,
    Click,
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    /// The document root.
    Document,
    /// The document body.
    Body,
    /// A specific element.
    Node(NodeId),
}

/// Capture listeners run before the target's own listeners; bubble after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerPhase {
    Capture,
    Bubble,
}

/// A subscribed callback. Identity (`Rc::ptr_eq`) is what makes removal
/// exact: removing a listener detaches the same instance that was added,
/// never a different subscriber's callback.
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// A platform input event delivered to listeners.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: EventKind,
    /// Element the event was aimed at (the focused or clicked element).
    pub target: Option<NodeId>,
    /// Key identity, present for keydown events only.
    pub key: Option<Key>,
    pub modifiers: Modifiers,
    default_prevented: Rc<Cell<bool>>,
}

impl DomEvent {
    /// Build a keydown event.
    pub fn keydown(key: Key, modifiers: Modifiers, target: Option<NodeId>) -> Self {
        Self {
            kind: EventKind::Keydown,
            target,
            key: Some(key),
            modifiers,
            default_prevented: Rc::new(Cell::new(false)),
        }
    }

    /// Build a focus event for the element gaining focus.
    pub fn focus(target: NodeId) -> Self {
        Self {
            kind: EventKind::Focus,
            target: Some(target),
            key: None,
            modifiers: Modifiers::empty(),
            default_prevented: Rc::new(Cell::new(false)),
        }
    }

    /// Build a click event.
    pub fn click(target: NodeId) -> Self {
        Self {
            kind: EventKind::Click,
            target: Some(target),
            key: None,
            modifiers: Modifiers::empty(),
            default_prevented: Rc::new(Cell::new(false)),
        }
    }

    /// Suppress the platform's default action for this event.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Whether any listener suppressed the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}
