#![forbid(unsafe_code)]

//! Markup-driven auto-discovery.
//!
//! The thin document-ready loop: every element flagged with the dialog
//! attribute gets wrapped with one controller. Hosts call this once after
//! the document settles and keep the returned controllers alive for as
//! long as the dialogs should stay wired.

use std::rc::Rc;

use anteroom_dom::DomSurface;

use crate::dialog::{DIALOG_ATTR, Dialog};

/// Wrap every element carrying [`DIALOG_ATTR`] with a [`Dialog`], in
/// document order.
pub fn mount_all<D: DomSurface + 'static>(dom: &Rc<D>) -> Vec<Dialog<D>> {
    dom.descendants(dom.document())
        .into_iter()
        .filter(|&node| dom.attribute(node, DIALOG_ATTR).is_some())
        .map(|node| Dialog::new(dom.clone(), node))
        .collect()
}
