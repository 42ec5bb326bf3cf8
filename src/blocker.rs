use crate::dom::{Document, NodeId};

/// Layering state of a blocking layer: the frontmost one is `Current`,
/// every other live layer sits `Behind` it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Current,
    Behind,
}

/// The full-viewport backdrop behind one dialog.
///
/// Its existence is strictly nested inside its owning instance's: created
/// during `block`, destroyed when the close sequence releases it.
#[derive(Debug)]
pub struct BlockingLayer {
    node: NodeId,
    placement: Placement,
}

impl BlockingLayer {
    /// Create the backdrop element and append it to the body. New layers
    /// start out `Current`; the stack's layering pass demotes the rest.
    pub fn create(doc: &mut Document) -> Self {
        let node = doc.create_element("div");
        doc.add_class(node, "blocker");
        doc.add_class(node, "current");
        let body = doc.body();
        doc.append(body, node);
        Self {
            node,
            placement: Placement::Current,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn set_placement(&mut self, doc: &mut Document, placement: Placement) {
        self.placement = placement;
        match placement {
            Placement::Current => {
                doc.add_class(self.node, "current");
                doc.remove_class(self.node, "behind");
            }
            Placement::Behind => {
                doc.remove_class(self.node, "current");
                doc.add_class(self.node, "behind");
            }
        }
    }

    /// Tear the layer down: children return to the body, the backdrop node
    /// leaves the tree.
    pub fn destroy(self, doc: &mut Document) {
        let body = doc.body();
        doc.move_children(self.node, body);
        doc.detach(self.node);
    }
}
