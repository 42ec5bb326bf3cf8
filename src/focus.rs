use crate::dom::{Document, NodeId};

/// Direction of a tab traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapDirection {
    Forward,
    Backward,
}

/// What the trap decided for one Tab press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapAction {
    /// No focusable descendants: focus the container itself and suppress the
    /// default tab action.
    FocusContainer,
    /// Wrap focus to this element and suppress the default tab action.
    Redirect(NodeId),
    /// Focus is somewhere in the middle of the cycle: let the host's native
    /// traversal handle it.
    Native,
}

const FOCUSABLE_FORM_TAGS: &[&str] = &["input", "select", "textarea", "button"];
const FOCUSABLE_EMBED_TAGS: &[&str] = &["iframe", "object", "embed"];

/// The fixed capability predicate: links and areas with a destination,
/// enabled form controls, embedded content, explicit tab index, editable
/// content.
fn is_focusable(doc: &Document, id: NodeId) -> bool {
    let tag = doc.tag(id);
    if (tag == "a" || tag == "area") && doc.has_attr(id, "href") {
        return true;
    }
    if FOCUSABLE_FORM_TAGS.contains(&tag) && !doc.has_attr(id, "disabled") {
        return true;
    }
    if FOCUSABLE_EMBED_TAGS.contains(&tag) {
        return true;
    }
    doc.has_attr(id, "tabindex") || doc.has_attr(id, "contenteditable")
}

/// The container's focusable descendants, in document order, filtered to
/// the currently visible ones.
pub fn focusable_descendants(doc: &Document, container: NodeId) -> Vec<NodeId> {
    doc.descendants(container)
        .into_iter()
        .filter(|&id| is_focusable(doc, id) && doc.is_visible(id))
        .collect()
}

/// Decide where one Tab press inside `container` should land.
///
/// Pure function of the container, the currently focused element and the
/// direction; reacts to key events only, never polls.
pub fn resolve(
    doc: &Document,
    container: NodeId,
    focused: Option<NodeId>,
    direction: TrapDirection,
) -> TrapAction {
    let focusables = focusable_descendants(doc, container);
    if focusables.is_empty() {
        return TrapAction::FocusContainer;
    }

    let index = focused.and_then(|f| focusables.iter().position(|&id| id == f));
    match direction {
        TrapDirection::Forward => match index {
            // Not focused inside the dialog, or on the last item: wrap to
            // the first focusable element.
            None => TrapAction::Redirect(focusables[0]),
            Some(i) if i == focusables.len() - 1 => TrapAction::Redirect(focusables[0]),
            Some(_) => TrapAction::Native,
        },
        TrapDirection::Backward => match index {
            None => TrapAction::Redirect(focusables[focusables.len() - 1]),
            Some(0) => TrapAction::Redirect(focusables[focusables.len() - 1]),
            Some(_) => TrapAction::Native,
        },
    }
}

/// Apply the trap decision to the document. Returns true when the default
/// tab action must be suppressed.
pub fn apply(doc: &mut Document, container: NodeId, direction: TrapDirection) -> bool {
    match resolve(doc, container, doc.focused(), direction) {
        TrapAction::FocusContainer => {
            doc.focus(container);
            true
        }
        TrapAction::Redirect(target) => {
            doc.focus(target);
            true
        }
        TrapAction::Native => false,
    }
}
