use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use anyhow::Result;
use futures::Future;

use crate::dom::{Document, NodeId};
use crate::event::{EventBus, EventKind, REL_CLOSE, REL_OPEN};
use crate::focus::{self, TrapDirection};
use crate::lifecycle::{LifecycleState, ModalCtx, ModalId, ModalInstance};
use crate::loader::ContentLoader;
use crate::options::Options;
use crate::resolver::{self, ContentSource};
use crate::sched::FadeScheduler;
use crate::stack::ModalStack;

/// Keyboard input the document-level listener cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Escape,
    Tab,
    ShiftTab,
}

/// An in-flight remote fragment fetch, polled cooperatively.
struct PendingFetch {
    modal_id: ModalId,
    trigger: NodeId,
    future: Pin<Box<dyn Future<Output = Result<String>> + Send>>,
}

/// The modal engine: owns the host document handle, the stack, the
/// notification bus, the fade scheduler and the content loader, and routes
/// every input through them.
///
/// Single-threaded and cooperative: every state transition runs to
/// completion inside one of the public entry points; the only suspension
/// points are the fade timers and the remote fetch, both resumed from
/// [`poll`](Self::poll).
pub struct ModalRuntime {
    doc: Document,
    stack: ModalStack,
    /// Popped instances still owed fade completions.
    draining: Vec<ModalInstance>,
    events: EventBus,
    fades: FadeScheduler,
    loader: Arc<dyn ContentLoader>,
    pending_fetches: Vec<PendingFetch>,
    next_id: u64,
}

impl ModalRuntime {
    pub fn new(doc: Document, loader: Arc<dyn ContentLoader>) -> Self {
        Self {
            doc,
            stack: ModalStack::new(),
            draining: Vec::new(),
            events: EventBus::new(),
            fades: FadeScheduler::new(),
            loader,
            pending_fetches: Vec::new(),
            next_id: 0,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn stack(&self) -> &ModalStack {
        &self.stack
    }

    pub fn is_active(&self) -> bool {
        self.stack.is_active()
    }

    pub fn current(&self) -> Option<&ModalInstance> {
        self.stack.current()
    }

    pub fn fades(&self) -> &FadeScheduler {
        &self.fades
    }

    fn alloc_id(&mut self) -> ModalId {
        self.next_id += 1;
        ModalId::from_raw(self.next_id)
    }

    /// Split the engine into the lifecycle context plus the parts it cannot
    /// contain (disjoint borrows of self).
    fn split(&mut self, now: Instant) -> (ModalCtx<'_>, &mut ModalStack, &mut Vec<ModalInstance>) {
        (
            ModalCtx {
                doc: &mut self.doc,
                events: &mut self.events,
                fades: &mut self.fades,
                now,
            },
            &mut self.stack,
            &mut self.draining,
        )
    }

    /// The keydown listener is a singleton: attached on the empty→non-empty
    /// transition, removed on non-empty→empty, never duplicated.
    fn sync_keydown(&mut self) {
        if self.stack.is_active() {
            if !self.doc.keydown_attached() {
                self.doc.attach_keydown();
            }
        } else if self.doc.keydown_attached() {
            self.doc.detach_keydown();
        }
    }

    // --- trigger activation -----------------------------------------------

    /// Resolve content for `trigger` and open a dialog with `options`.
    ///
    /// Returns the new instance's id, or None when resolution fails (no
    /// instance is created and no notification fires).
    pub fn open_from(&mut self, trigger: NodeId, options: Options) -> Option<ModalId> {
        let now = Instant::now();
        if options.close_existing {
            while self.stack.is_active() {
                self.close_current();
            }
        }
        match resolver::classify(&self.doc, trigger)? {
            ContentSource::Existing(node) => {
                let body = self.doc.body();
                self.doc.append(body, node);
                Some(self.open_direct(node, options, now))
            }
            ContentSource::Direct(node) => {
                let body = self.doc.body();
                self.doc.append(body, node);
                Some(self.open_direct(node, options, now))
            }
            ContentSource::Remote(url) => Some(self.open_remote(trigger, url, options, now)),
        }
    }

    fn open_direct(&mut self, content: NodeId, options: Options, now: Instant) -> ModalId {
        let id = self.alloc_id();
        self.stack.push(ModalInstance::new(id, content, options));
        self.sync_keydown();
        let (mut ctx, stack, _) = self.split(now);
        stack.open_top(&mut ctx);
        id
    }

    /// Remote fragment protocol: push an empty placeholder immediately so
    /// `is_active()` reflects the pending dialog, show the spinner, notify
    /// AjaxSend, and queue the fetch.
    fn open_remote(&mut self, trigger: NodeId, url: String, options: Options, now: Instant) -> ModalId {
        let placeholder = self.doc.create_element("div");
        let body = self.doc.body();
        self.doc.append(body, placeholder);

        let id = self.alloc_id();
        let mut instance = ModalInstance::new(id, placeholder, options);
        instance.show_spinner(&mut self.doc);
        self.stack.push(instance);
        self.sync_keydown();

        let (mut ctx, stack, _) = self.split(now);
        let instance = stack.find(id).expect("instance was just pushed");
        ctx.emit(EventKind::AjaxSend, placeholder, None, instance.options_arc());

        log::info!("fetching remote modal content from {url}");
        let loader = Arc::clone(&self.loader);
        let future = Box::pin(async move { loader.get(&url).await });
        self.pending_fetches.push(PendingFetch {
            modal_id: id,
            trigger,
            future,
        });
        id
    }

    // --- closing ----------------------------------------------------------

    /// Close the topmost dialog. No-op on an empty stack. Returns the closed
    /// content element.
    pub fn close_current(&mut self) -> Option<NodeId> {
        let now = Instant::now();
        if !self.stack.is_active() {
            return None;
        }
        let (mut ctx, stack, draining) = self.split(now);
        let mut instance = stack.pop()?;
        stack.recompute_layering(ctx.doc);
        instance.close(&mut ctx, stack);
        let content = instance.content();
        if ctx.fades.has_jobs_for(instance.id()) {
            draining.push(instance);
        }
        self.sync_keydown();
        Some(content)
    }

    /// Close a specific dialog by handle, wherever it sits in the stack.
    pub fn close(&mut self, id: ModalId) -> bool {
        let now = Instant::now();
        let (mut ctx, stack, draining) = self.split(now);
        let Some(mut instance) = stack.remove(id) else {
            return false;
        };
        stack.recompute_layering(ctx.doc);
        instance.close(&mut ctx, stack);
        if ctx.fades.has_jobs_for(id) {
            draining.push(instance);
        }
        self.sync_keydown();
        true
    }

    // --- input routing ----------------------------------------------------

    /// Document-level keydown. Returns true when the input was consumed and
    /// default handling must be suppressed. Inactive (detached) while the
    /// stack is empty.
    pub fn handle_key(&mut self, key: KeyInput) -> bool {
        if !self.stack.is_active() {
            return false;
        }
        match key {
            KeyInput::Escape => {
                let permitted = self
                    .stack
                    .current()
                    .map(|i| i.options().escape_close)
                    .unwrap_or(false);
                if permitted {
                    self.close_current();
                    true
                } else {
                    false
                }
            }
            KeyInput::Tab => self.trap_tab(TrapDirection::Forward),
            KeyInput::ShiftTab => self.trap_tab(TrapDirection::Backward),
        }
    }

    fn trap_tab(&mut self, direction: TrapDirection) -> bool {
        match self.stack.current() {
            Some(instance) => {
                let container = instance.content();
                focus::apply(&mut self.doc, container, direction)
            }
            None => false,
        }
    }

    /// Document-level click delegation: declarative close/open affordances
    /// and outside-clicks on a blocking layer. Returns true when consumed.
    pub fn handle_click(&mut self, node: NodeId) -> bool {
        if self.doc.attr_contains_word(node, "rel", REL_CLOSE) {
            self.close_current();
            return true;
        }
        if self.doc.tag(node) == "a" && self.doc.attr_contains_word(node, "rel", REL_OPEN) {
            self.open_from(node, Options::default());
            return true;
        }
        let closes = self
            .stack
            .iter()
            .any(|i| i.blocker_node() == Some(node) && i.options().click_close);
        if closes {
            self.close_current();
            return true;
        }
        false
    }

    // --- cooperative progress ---------------------------------------------

    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// Run every fade completion that came due and poll the in-flight
    /// fetches once. Transitions triggered here run to completion before the
    /// next one starts.
    pub fn poll_at(&mut self, now: Instant) {
        for job in self.fades.take_due(now) {
            self.run_job(job, now);
        }
        self.poll_fetches(now);

        // Drop drained instances once nothing is scheduled against them.
        let fades = &self.fades;
        self.draining.retain(|i| fades.has_jobs_for(i.id()));
    }

    fn run_job(&mut self, job: crate::sched::FadeJob, now: Instant) {
        use crate::sched::FadeJob;
        let (mut ctx, stack, draining) = self.split(now);
        match job {
            FadeJob::RevealContent(id) => {
                // A dialog closed before its deferred reveal stays hidden.
                if let Some(instance) = stack.find_mut(id) {
                    if instance.state() == LifecycleState::Blocking {
                        instance.reveal(&mut ctx);
                    }
                }
            }
            FadeJob::BlockerFadedIn(id) => {
                // Stale fade-ins on an already-closing dialog are dropped;
                // its layer is fading out.
                if let Some(instance) = stack.find_mut(id) {
                    instance.blocker_faded_in(&mut ctx);
                }
            }
            FadeJob::ContentFadedIn(id) => {
                if let Some(instance) = stack.find_mut(id) {
                    instance.content_faded_in(&mut ctx);
                }
            }
            FadeJob::HideComplete(id) => {
                if let Some(instance) = stack.find_mut(id) {
                    instance.hide_complete(&mut ctx);
                } else if let Some(instance) = draining.iter_mut().find(|i| i.id() == id) {
                    instance.hide_complete(&mut ctx);
                }
            }
            FadeJob::DestroyBlocker(id) => {
                // Closing always detaches the instance first, so the
                // deferred teardown only ever finds it draining.
                if let Some(instance) = draining.iter_mut().find(|i| i.id() == id) {
                    instance.release_blocker(&mut ctx, stack, true);
                }
            }
        }
    }

    fn poll_fetches(&mut self, now: Instant) {
        if self.pending_fetches.is_empty() {
            return;
        }
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut completed = Vec::new();
        for (i, fetch) in self.pending_fetches.iter_mut().enumerate() {
            if let Poll::Ready(result) = fetch.future.as_mut().poll(&mut cx) {
                completed.push((i, result));
            }
        }
        // Remove in reverse so earlier indices stay valid.
        completed.sort_by(|a, b| b.0.cmp(&a.0));
        for (i, result) in completed {
            let PendingFetch { modal_id, trigger, .. } = self.pending_fetches.remove(i);
            self.finish_fetch(modal_id, trigger, result, now);
        }
    }

    fn finish_fetch(&mut self, id: ModalId, trigger: NodeId, result: Result<String>, now: Instant) {
        // Staleness guard: a fast close may have discarded the placeholder
        // while the fetch was in flight.
        if self.stack.find(id).is_none() {
            log::debug!("discarding fetch completion for closed dialog {id:?} (trigger {trigger:?})");
            return;
        }
        match result {
            Ok(html) => {
                let (mut ctx, stack, _) = self.split(now);
                let index = stack.position(id).expect("guarded above");
                {
                    let instance = stack.find_mut(id).expect("guarded above");
                    let content = instance.content();
                    ctx.emit(
                        EventKind::AjaxSuccess,
                        content,
                        instance.blocker_node(),
                        instance.options_arc(),
                    );
                    ctx.doc.clear_children(content);
                    ctx.doc.set_markup(content, html);
                    // Fetched content is transient: discard it when this
                    // dialog's Close notification fires.
                    ctx.events.hook_close(content, move |doc| doc.detach(content));
                    instance.hide_spinner(ctx.doc);
                }
                stack.open_at(index, &mut ctx);
                let instance = stack.find(id).expect("guarded above");
                ctx.emit(
                    EventKind::AjaxComplete,
                    instance.content(),
                    instance.blocker_node(),
                    instance.options_arc(),
                );
            }
            Err(err) => {
                log::warn!("remote modal content failed: {err:#}");
                let (mut ctx, stack, _) = self.split(now);
                {
                    let instance = stack.find(id).expect("guarded above");
                    ctx.emit(
                        EventKind::AjaxFail,
                        instance.content(),
                        instance.blocker_node(),
                        instance.options_arc(),
                    );
                }
                let mut instance = stack.remove(id).expect("guarded above");
                instance.hide_spinner(ctx.doc);
                ctx.doc.detach(instance.content());
                ctx.emit(
                    EventKind::AjaxComplete,
                    instance.content(),
                    None,
                    instance.options_arc(),
                );
                self.sync_keydown();
            }
        }
    }
}
