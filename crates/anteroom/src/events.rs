#![forbid(unsafe_code)]

//! Lifecycle event names and the registered-handler side of the event bus.
//!
//! Handlers are stored per event name in insertion order, duplicates
//! allowed. Removal matches by identity (`Rc::ptr_eq`) and takes the first
//! hit, so registering the same handler twice and removing it once leaves
//! one registration behind.

use std::rc::Rc;

use ahash::AHashMap;
use anteroom_dom::NodeId;
use anteroom_dom::event::DomEvent;

/// The four lifecycle events a dialog fires, each exactly once per real
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogEvent {
    Create,
    Show,
    Hide,
    Destroy,
}

impl DialogEvent {
    /// Stable event name used for the platform-native dispatch channel.
    pub const fn name(self) -> &'static str {
        match self {
            DialogEvent::Create => "create",
            DialogEvent::Show => "show",
            DialogEvent::Hide => "hide",
            DialogEvent::Destroy => "destroy",
        }
    }
}

/// A registered lifecycle handler. Receives the dialog element and the
/// optional input event that triggered the transition.
pub type DialogHandler = Rc<dyn Fn(NodeId, Option<&DomEvent>)>;

/// Ordered handler lists keyed by lifecycle event.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: AHashMap<DialogEvent, Vec<DialogHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `event`.
    pub fn on(&mut self, event: DialogEvent, handler: DialogHandler) {
        self.handlers.entry(event).or_default().push(handler);
    }

    /// Remove the first registration of `handler` for `event`, matched by
    /// identity. Unregistered handlers are a no-op, not an error.
    pub fn off(&mut self, event: DialogEvent, handler: &DialogHandler) {
        if let Some(list) = self.handlers.get_mut(&event)
            && let Some(position) = list.iter().position(|h| Rc::ptr_eq(h, handler))
        {
            list.remove(position);
        }
    }

    /// Clone the current handler list for `event`, in registration order.
    /// A snapshot keeps dispatch safe against handlers that re-enter
    /// `on`/`off` while running.
    pub fn snapshot(&self, event: DialogEvent) -> Vec<DialogHandler> {
        self.handlers.get(&event).cloned().unwrap_or_default()
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self, event: DialogEvent) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anteroom_dom::DomSurface;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> DialogHandler {
        let log = log.clone();
        Rc::new(move |_, _| log.borrow_mut().push(tag))
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.on(DialogEvent::Show, recorder(&log, "first"));
        registry.on(DialogEvent::Show, recorder(&log, "second"));

        let element = anteroom_dom::fake::FakeDom::new().body();
        for handler in registry.snapshot(DialogEvent::Show) {
            handler(element, None);
        }
        assert_eq!(log.borrow().as_slice(), &["first", "second"]);
    }

    #[test]
    fn duplicates_are_kept_and_removed_one_at_a_time() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        let handler = recorder(&log, "dup");
        registry.on(DialogEvent::Hide, handler.clone());
        registry.on(DialogEvent::Hide, handler.clone());
        assert_eq!(registry.len(DialogEvent::Hide), 2);

        registry.off(DialogEvent::Hide, &handler);
        assert_eq!(registry.len(DialogEvent::Hide), 1);
    }

    #[test]
    fn off_unregistered_is_a_no_op() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        let never_added = recorder(&log, "never");
        registry.off(DialogEvent::Destroy, &never_added);
        assert!(registry.is_empty());
    }

    #[test]
    fn off_matches_identity_not_equivalence() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        let kept = recorder(&log, "same-tag");
        let removed = recorder(&log, "same-tag");
        registry.on(DialogEvent::Show, kept.clone());
        registry.off(DialogEvent::Show, &removed);
        assert_eq!(registry.len(DialogEvent::Show), 1);
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(DialogEvent::Create.name(), "create");
        assert_eq!(DialogEvent::Show.name(), "show");
        assert_eq!(DialogEvent::Hide.name(), "hide");
        assert_eq!(DialogEvent::Destroy.name(), "destroy");
    }
}
