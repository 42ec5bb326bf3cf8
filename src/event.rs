use std::collections::HashMap;
use std::sync::Arc;

use crate::dom::{Document, NodeId};
use crate::options::Options;

/// Declarative relationship markers recognized on document elements.
pub const REL_CLOSE: &str = "dockedmodal:close";
pub const REL_OPEN: &str = "dockedmodal:open";

/// Every notification the modal machinery fires, in lifecycle order for a
/// single dialog: BeforeBlock, Block, BeforeOpen, Open, BeforeClose, Close,
/// AfterClose. The Ajax variants accompany remote content resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BeforeBlock,
    Block,
    BeforeOpen,
    Open,
    BeforeClose,
    Close,
    AfterClose,
    AjaxSend,
    AjaxSuccess,
    AjaxFail,
    AjaxComplete,
}

/// Structured notification payload: the content element, the blocking layer
/// (absent while no layer exists) and the dialog's resolved options.
#[derive(Clone)]
pub struct ModalEvent {
    pub kind: EventKind,
    pub content: NodeId,
    pub blocker: Option<NodeId>,
    pub options: Arc<Options>,
}

type Observer = Box<dyn FnMut(&ModalEvent) + Send>;
type CloseHook = Box<dyn FnOnce(&mut Document) + Send>;

/// Observer registry for modal notifications.
///
/// External collaborators subscribe per kind or to everything; handlers only
/// see the event and cannot reach back into the modal state. Separately the
/// bus carries one-shot close hooks: document cleanups keyed by content
/// element that run exactly once when that content's Close notification
/// fires. Observers always run before hooks.
#[derive(Default)]
pub struct EventBus {
    by_kind: HashMap<EventKind, Vec<Observer>>,
    all: Vec<Observer>,
    close_hooks: Vec<(NodeId, CloseHook)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&ModalEvent) + Send + 'static,
    {
        self.by_kind.entry(kind).or_default().push(Box::new(handler));
    }

    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: FnMut(&ModalEvent) + Send + 'static,
    {
        self.all.push(Box::new(handler));
    }

    /// Register a one-shot cleanup that runs when `content`'s Close
    /// notification fires. Used by the remote-content path to discard
    /// fetched markup.
    pub fn hook_close<F>(&mut self, content: NodeId, hook: F)
    where
        F: FnOnce(&mut Document) + Send + 'static,
    {
        self.close_hooks.push((content, Box::new(hook)));
    }

    pub fn emit(&mut self, event: &ModalEvent, doc: &mut Document) {
        log::debug!("emit {:?} for content {:?}", event.kind, event.content);
        for observer in &mut self.all {
            observer(event);
        }
        if let Some(observers) = self.by_kind.get_mut(&event.kind) {
            for observer in observers {
                observer(event);
            }
        }
        if event.kind == EventKind::Close {
            let hooks = std::mem::take(&mut self.close_hooks);
            let (run, keep): (Vec<_>, Vec<_>) =
                hooks.into_iter().partition(|(id, _)| *id == event.content);
            self.close_hooks = keep;
            for (_, hook) in run {
                hook(doc);
            }
        }
    }
}
