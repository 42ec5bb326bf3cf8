use crate::dom::{Document, NodeId};

/// Where a requested dialog's content comes from, decided from the trigger
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A same-document fragment reference: the existing element to display.
    Existing(NodeId),
    /// An external URL whose fragment must be fetched asynchronously.
    Remote(String),
    /// The trigger element itself is the content.
    Direct(NodeId),
}

/// Classify a trigger element.
///
/// Hyperlinks with a fragment href resolve synchronously to the referenced
/// element; an identifier matching zero or several elements is a resolution
/// error and the whole operation aborts (None — no instance, no
/// notification). Hyperlinks with any other href become remote fetches.
/// Everything else, including an anchor without an href, is its own content.
pub fn classify(doc: &Document, trigger: NodeId) -> Option<ContentSource> {
    if doc.tag(trigger) == "a" {
        if let Some(href) = doc.attr(trigger, "href") {
            if let Some(fragment) = href.strip_prefix('#') {
                return match doc.element_by_id(fragment) {
                    Some(node) => Some(ContentSource::Existing(node)),
                    None => {
                        log::warn!("fragment #{fragment} does not resolve to exactly one element");
                        None
                    }
                };
            }
            return Some(ContentSource::Remote(href.to_string()));
        }
    }
    Some(ContentSource::Direct(trigger))
}
