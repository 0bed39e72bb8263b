#![forbid(unsafe_code)]

//! Accessible modal-dialog controller.
//!
//! Anteroom manages the open/closed lifecycle of a dialog region, enforces
//! a focus trap while it is open, restores focus on close, and exposes a
//! lifecycle event bus with dual delivery (registered handlers plus a
//! platform-native event on the dialog element).
//!
//! The core never touches a rendering engine. Everything platform-specific
//! is injected through [`anteroom_dom::DomSurface`]; the bundled
//! [`anteroom_dom::fake::FakeDom`] drives the whole state machine in
//! memory.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use anteroom::{Dialog, DialogEvent};
//! use anteroom_dom::DomSurface;
//! use anteroom_dom::fake::FakeDom;
//!
//! let dom = Rc::new(FakeDom::new());
//! let element = dom.create_in(dom.body(), "div");
//! let save = dom.create_in(element, "button");
//! dom.set_attribute(save, "autofocus", "");
//!
//! let dialog = Dialog::new(dom.clone(), element);
//! dialog.on(DialogEvent::Show, Rc::new(|_, _| println!("opened")));
//! dialog.show();
//! assert_eq!(dom.active_element(), Some(save));
//! dialog.hide();
//! ```

pub mod bootstrap;
pub mod dialog;
pub mod events;
pub mod focusable;
pub mod trap;

pub use bootstrap::mount_all;
pub use dialog::{Dialog, DIALOG_ATTR, HIDE_ATTR, IGNORE_FOCUS_TRAP_ATTR, SHOW_ATTR};
pub use events::{DialogEvent, DialogHandler, HandlerRegistry};
pub use focusable::{FOCUSABLE_RULES, FocusRule, focusable_children};
pub use trap::trap_tab_key;
