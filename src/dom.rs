use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable handle to a node in the host document.
///
/// Ids are assigned monotonically and never reused, so a `NodeId` held across
/// an open/close cycle keeps referring to the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

/// On-screen rectangle of an element, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// A single element in the node tree.
#[derive(Debug)]
struct Node {
    tag: String,
    attrs: HashMap<String, String>,
    classes: Vec<String>,
    visible: bool,
    opacity: f64,
    /// Raw markup payload for remotely fetched fragments.
    markup: Option<String>,
    /// Layout rectangle, supplied by the host's layout pass.
    rect: Option<Rect>,
    /// Docked positioning offsets: (right, top).
    offset: Option<(i32, i32)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: HashMap::new(),
            classes: Vec::new(),
            visible: true,
            opacity: 1.0,
            markup: None,
            rect: None,
            offset: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Abstract handle to the host document.
///
/// The real rendering engine lives outside this crate; `Document` is the
/// node-tree the modal machinery manipulates. Reparenting is an explicit
/// ownership transfer: a node has at most one parent, and `append` detaches
/// it from any previous one. The document also carries the shared state the
/// modal stack toggles as a whole: the scroll lock, the keydown listener and
/// the focused element.
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    next_id: u32,
    body: NodeId,
    viewport_width: i32,
    viewport_height: i32,
    scroll_y: i32,
    scroll_locked: bool,
    keydown_attached: bool,
    focused: Option<NodeId>,
}

impl Document {
    pub fn new(viewport_width: i32, viewport_height: i32) -> Self {
        let mut nodes = HashMap::new();
        let body = NodeId(0);
        nodes.insert(body, Node::new("body"));
        Self {
            nodes,
            next_id: 1,
            body,
            viewport_width,
            viewport_height,
            scroll_y: 0,
            scroll_locked: false,
            keydown_attached: false,
            focused: None,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport_width(&self) -> i32 {
        self.viewport_width
    }

    pub fn viewport_height(&self) -> i32 {
        self.viewport_height
    }

    pub fn scroll_y(&self) -> i32 {
        self.scroll_y
    }

    pub fn set_scroll_y(&mut self, y: i32) {
        self.scroll_y = y;
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(&id).expect("node id out of this document")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(&id).expect("node id out of this document")
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(tag));
        id
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    // --- tree structure ---------------------------------------------------

    /// Append `child` under `parent`, detaching it from any previous parent.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(parent != child, "cannot append a node to itself");
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Unlink `id` from its parent. The node itself stays valid and can be
    /// re-appended later (the spinner element relies on this).
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Move every child of `from` under `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.node_mut(from).children);
        for child in children {
            self.node_mut(to).children.push(child);
            self.node_mut(child).parent = Some(to);
        }
    }

    /// Detach all children of `id` and drop any fetched markup.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        self.node_mut(id).markup = None;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Preorder traversal of all descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            for &child in self.node(next).children.iter().rev() {
                pending.push(child);
            }
        }
        out
    }

    /// True when `id` is attached under the body, directly or transitively.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = id;
        loop {
            if cursor == self.body {
                return true;
            }
            match self.node(cursor).parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    // --- attributes and classes -------------------------------------------

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.node_mut(id).attrs.insert(name.to_string(), value.to_string());
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.node(id).attrs.contains_key(name)
    }

    /// Whitespace-separated membership test, the `rel~="value"` selector.
    pub fn attr_contains_word(&self, id: NodeId, name: &str, word: &str) -> bool {
        self.attr(id, name)
            .map(|v| v.split_whitespace().any(|w| w == word))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let node = self.node_mut(id);
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        self.node_mut(id).classes.retain(|c| c != class);
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).classes.iter().any(|c| c == class)
    }

    // --- presentation -----------------------------------------------------

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.node_mut(id).visible = visible;
    }

    /// Visibility of the node itself, ignoring ancestors.
    pub fn is_shown(&self, id: NodeId) -> bool {
        self.node(id).visible
    }

    /// Effective visibility: the node and every ancestor up to the body must
    /// be shown, and the node must be attached at all.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cursor = id;
        loop {
            if !self.node(cursor).visible {
                return false;
            }
            if cursor == self.body {
                return true;
            }
            match self.node(cursor).parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: f64) {
        self.node_mut(id).opacity = opacity;
    }

    pub fn opacity(&self, id: NodeId) -> f64 {
        self.node(id).opacity
    }

    pub fn set_markup(&mut self, id: NodeId, markup: String) {
        self.node_mut(id).markup = Some(markup);
    }

    pub fn markup(&self, id: NodeId) -> Option<&str> {
        self.node(id).markup.as_deref()
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        self.node_mut(id).rect = Some(rect);
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.node(id).rect.unwrap_or_default()
    }

    /// Docked positioning: store (right, top) offsets on the node.
    pub fn set_dock_offset(&mut self, id: NodeId, right: i32, top: i32) {
        self.node_mut(id).offset = Some((right, top));
    }

    pub fn dock_offset(&self, id: NodeId) -> Option<(i32, i32)> {
        self.node(id).offset
    }

    // --- id lookup --------------------------------------------------------

    /// Resolve a fragment identifier to the single attached element carrying
    /// that `id` attribute. None when the identifier resolves to zero or to
    /// more than one element.
    pub fn element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        let mut found = None;
        for node in self.descendants(self.body) {
            if self.attr(node, "id") == Some(dom_id) {
                if found.is_some() {
                    return None;
                }
                found = Some(node);
            }
        }
        found
    }

    // --- document-wide shared state ---------------------------------------

    pub fn focus(&mut self, id: NodeId) {
        self.focused = Some(id);
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn lock_scroll(&mut self) {
        self.scroll_locked = true;
    }

    pub fn unlock_scroll(&mut self) {
        self.scroll_locked = false;
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn attach_keydown(&mut self) {
        self.keydown_attached = true;
    }

    pub fn detach_keydown(&mut self) {
        self.keydown_attached = false;
    }

    pub fn keydown_attached(&self) -> bool {
        self.keydown_attached
    }
}
