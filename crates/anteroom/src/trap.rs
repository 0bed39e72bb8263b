#![forbid(unsafe_code)]

//! Cyclic tab-order wrapping for an open dialog.

use anteroom_dom::event::{DomEvent, Modifiers};
use anteroom_dom::{DomSurface, NodeId};

use crate::focusable::focusable_children;

/// Handle a Tab keydown inside `container`, wrapping focus at the edges of
/// the live focusable sequence.
///
/// Only the two boundary cases act: Shift+Tab on the first focusable
/// element wraps to the last, plain Tab on the last wraps to the first,
/// both suppressing the platform default. Anywhere else, including when
/// focus is on the container itself or outside the sequence, the default
/// traversal proceeds untouched.
///
/// An empty sequence wraps nothing: the container keeps focus and the
/// press has no observable effect.
pub fn trap_tab_key<D: DomSurface + ?Sized>(dom: &D, container: NodeId, event: &DomEvent) {
    let focusable = focusable_children(dom, container);
    let Some(active) = dom.active_element() else {
        return;
    };
    let index = focusable.iter().position(|&n| n == active);
    let backward = event.modifiers.contains(Modifiers::SHIFT);

    match index {
        Some(0) if backward => {
            event.prevent_default();
            if let Some(&last) = focusable.last() {
                dom.focus(last);
            }
        }
        Some(i) if !backward && i + 1 == focusable.len() => {
            event.prevent_default();
            dom.focus(focusable[0]);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anteroom_dom::event::Key;
    use anteroom_dom::fake::FakeDom;

    fn dialog_with_three_buttons(dom: &FakeDom) -> (NodeId, NodeId, NodeId, NodeId) {
        let container = dom.create_in(dom.body(), "div");
        let a = dom.create_in(container, "button");
        let b = dom.create_in(container, "button");
        let c = dom.create_in(container, "button");
        (container, a, b, c)
    }

    fn tab_event(dom: &FakeDom, modifiers: Modifiers) -> DomEvent {
        DomEvent::keydown(Key::Tab, modifiers, dom.active_element())
    }

    #[test]
    fn tab_on_last_wraps_to_first() {
        let dom = FakeDom::new();
        let (container, a, _b, c) = dialog_with_three_buttons(&dom);
        dom.focus(c);

        let event = tab_event(&dom, Modifiers::empty());
        trap_tab_key(&dom, container, &event);

        assert!(event.default_prevented());
        assert_eq!(dom.active_element(), Some(a));
    }

    #[test]
    fn shift_tab_on_first_wraps_to_last() {
        let dom = FakeDom::new();
        let (container, a, _b, c) = dialog_with_three_buttons(&dom);
        dom.focus(a);

        let event = tab_event(&dom, Modifiers::SHIFT);
        trap_tab_key(&dom, container, &event);

        assert!(event.default_prevented());
        assert_eq!(dom.active_element(), Some(c));
    }

    #[test]
    fn interior_tab_is_left_to_the_platform() {
        let dom = FakeDom::new();
        let (container, _a, b, _c) = dialog_with_three_buttons(&dom);
        dom.focus(b);

        let event = tab_event(&dom, Modifiers::empty());
        trap_tab_key(&dom, container, &event);

        assert!(!event.default_prevented());
        assert_eq!(dom.active_element(), Some(b));
    }

    #[test]
    fn focus_on_container_itself_does_not_wrap() {
        let dom = FakeDom::new();
        let (container, ..) = dialog_with_three_buttons(&dom);
        dom.set_attribute(container, "tabindex", "-1");
        dom.focus(container);

        let event = tab_event(&dom, Modifiers::empty());
        trap_tab_key(&dom, container, &event);

        assert!(!event.default_prevented());
        assert_eq!(dom.active_element(), Some(container));
    }

    #[test]
    fn empty_sequence_does_nothing() {
        let dom = FakeDom::new();
        let container = dom.create_in(dom.body(), "div");
        dom.set_attribute(container, "tabindex", "-1");
        dom.focus(container);

        let event = tab_event(&dom, Modifiers::empty());
        trap_tab_key(&dom, container, &event);

        assert!(!event.default_prevented());
        assert_eq!(dom.active_element(), Some(container));
    }

    #[test]
    fn single_element_wraps_onto_itself() {
        let dom = FakeDom::new();
        let container = dom.create_in(dom.body(), "div");
        let only = dom.create_in(container, "button");
        dom.focus(only);

        let event = tab_event(&dom, Modifiers::empty());
        trap_tab_key(&dom, container, &event);

        assert!(event.default_prevented());
        assert_eq!(dom.active_element(), Some(only));
    }

    #[test]
    fn wrap_respects_live_visibility_changes() {
        let dom = FakeDom::new();
        let (container, a, b, c) = dialog_with_three_buttons(&dom);
        dom.set_rendered(c, false);
        dom.focus(a);

        // With C hidden the sequence is [A, B]; Shift+Tab from A lands on B.
        let event = tab_event(&dom, Modifiers::SHIFT);
        trap_tab_key(&dom, container, &event);

        assert!(event.default_prevented());
        assert_eq!(dom.active_element(), Some(b));
    }
}
