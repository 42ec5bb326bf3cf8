use std::sync::Arc;
use std::time::Instant;

use crate::blocker::BlockingLayer;
use crate::dom::{Document, NodeId};
use crate::event::{EventBus, EventKind, ModalEvent, REL_CLOSE};
use crate::options::Options;
use crate::sched::{FadeJob, FadeScheduler};
use crate::stack::ModalStack;

/// Stable identity of one dialog instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalId(u64);

impl ModalId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Open/close state machine of a single dialog.
///
/// `Closed` is terminal; the instance is then eligible for removal once its
/// remaining fade jobs drain. Invoking a transition out of order is a caller
/// bug, not a guarded runtime condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Blocking,
    FadingIn,
    Visible,
    FadingOut,
    Closed,
}

/// Mutable context threaded through lifecycle transitions: the host
/// document, the notification bus, the fade scheduler and the instant the
/// triggering callback started.
pub struct ModalCtx<'a> {
    pub doc: &'a mut Document,
    pub events: &'a mut EventBus,
    pub fades: &'a mut FadeScheduler,
    pub now: Instant,
}

impl ModalCtx<'_> {
    pub fn emit(
        &mut self,
        kind: EventKind,
        content: NodeId,
        blocker: Option<NodeId>,
        options: &Arc<Options>,
    ) {
        let event = ModalEvent {
            kind,
            content,
            blocker,
            options: Arc::clone(options),
        };
        self.events.emit(&event, self.doc);
    }
}

/// One open dialog: its content element, its blocking layer and the state
/// machine driving both.
///
/// The content element is exclusively owned while open and returns to the
/// document body when the blocking layer is destroyed. The blocking layer's
/// existence is strictly nested inside the instance's.
pub struct ModalInstance {
    id: ModalId,
    content: NodeId,
    blocker: Option<BlockingLayer>,
    options: Arc<Options>,
    state: LifecycleState,
    close_button: Option<NodeId>,
    spinner: Option<NodeId>,
}

impl ModalInstance {
    pub fn new(id: ModalId, content: NodeId, options: Options) -> Self {
        Self {
            id,
            content,
            blocker: None,
            options: Arc::new(options),
            state: LifecycleState::Created,
            close_button: None,
            spinner: None,
        }
    }

    pub fn id(&self) -> ModalId {
        self.id
    }

    pub fn content(&self) -> NodeId {
        self.content
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn options_arc(&self) -> &Arc<Options> {
        &self.options
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn blocker(&self) -> Option<&BlockingLayer> {
        self.blocker.as_ref()
    }

    pub fn blocker_mut(&mut self) -> Option<&mut BlockingLayer> {
        self.blocker.as_mut()
    }

    pub fn blocker_node(&self) -> Option<NodeId> {
        self.blocker.as_ref().map(|b| b.node())
    }

    // --- open sequence ----------------------------------------------------
    //
    // Driven by ModalStack::open_top, which interleaves the layering
    // recompute between blocker creation and the Block notification.

    /// First half of `block`: notify, engage the scroll lock, create the
    /// blocking layer. Precondition: state is Created.
    pub fn block_begin(&mut self, ctx: &mut ModalCtx) {
        debug_assert_eq!(self.state, LifecycleState::Created, "open() re-entered");
        ctx.emit(EventKind::BeforeBlock, self.content, None, &self.options);
        if self.options.scroll_lock {
            ctx.doc.lock_scroll();
        }
        self.blocker = Some(BlockingLayer::create(ctx.doc));
        self.state = LifecycleState::Blocking;
    }

    /// Second half of `block`: start the backdrop fade and notify.
    pub fn block_commit(&mut self, ctx: &mut ModalCtx) {
        if let Some(layer) = &self.blocker {
            if self.options.do_fade() {
                ctx.doc.set_opacity(layer.node(), 0.0);
                ctx.fades.schedule(
                    ctx.now + self.options.fade_duration(),
                    FadeJob::BlockerFadedIn(self.id),
                );
            }
        }
        ctx.emit(EventKind::Block, self.content, self.blocker_node(), &self.options);
    }

    /// Content reveal: build the close affordance, transfer the content into
    /// the blocking layer, start its fade, notify, and dock it against the
    /// anchor when one is configured.
    pub fn reveal(&mut self, ctx: &mut ModalCtx) {
        ctx.emit(EventKind::BeforeOpen, self.content, self.blocker_node(), &self.options);

        if self.options.show_close {
            let button = ctx.doc.create_element("a");
            ctx.doc.set_attr(button, "href", "#close-modal");
            ctx.doc.set_attr(button, "rel", REL_CLOSE);
            ctx.doc.add_class(button, "close-modal");
            if !self.options.close_class.is_empty() {
                ctx.doc.add_class(button, &self.options.close_class);
            }
            ctx.doc.set_markup(button, self.options.close_text.clone());
            ctx.doc.append(self.content, button);
            self.close_button = Some(button);
        }

        ctx.doc.add_class(self.content, &self.options.modal_class);
        debug_assert!(self.blocker.is_some(), "reveal without a blocking layer");
        if let Some(layer) = &self.blocker {
            ctx.doc.append(layer.node(), self.content);
        }

        if self.options.do_fade() {
            ctx.doc.set_opacity(self.content, 0.0);
            ctx.doc.set_visible(self.content, true);
            ctx.fades.schedule(
                ctx.now + self.options.fade_duration(),
                FadeJob::ContentFadedIn(self.id),
            );
            self.state = LifecycleState::FadingIn;
        } else {
            ctx.doc.set_visible(self.content, true);
            self.state = LifecycleState::Visible;
        }

        ctx.emit(EventKind::Open, self.content, self.blocker_node(), &self.options);

        if let Some(anchor) = self.options.dock_anchor {
            let rect = ctx.doc.rect(anchor);
            let right = ctx.doc.viewport_width() - rect.x - rect.width;
            let mut top = rect.bottom();
            if !self.options.scroll_lock {
                top -= ctx.doc.scroll_y();
            }
            ctx.doc.set_dock_offset(self.content, right, top);
            let marker = format!("{}-visible", self.options.modal_class);
            ctx.doc.add_class(self.content, &marker);
        }
    }

    /// Completion of the backdrop fade-in.
    pub fn blocker_faded_in(&mut self, ctx: &mut ModalCtx) {
        if let Some(layer) = &self.blocker {
            ctx.doc.set_opacity(layer.node(), 1.0);
        }
    }

    /// Completion of the content fade-in.
    pub fn content_faded_in(&mut self, ctx: &mut ModalCtx) {
        ctx.doc.set_opacity(self.content, 1.0);
        if self.state == LifecycleState::FadingIn {
            self.state = LifecycleState::Visible;
        }
    }

    // --- close sequence ---------------------------------------------------

    /// Run the close sequence. The caller has already removed the instance
    /// from the stack; `stack` is borrowed for the layering recompute and
    /// the drained-stack checks.
    pub fn close(&mut self, ctx: &mut ModalCtx, stack: &mut ModalStack) {
        self.release_blocker(ctx, stack, false);
        self.hide(ctx);
    }

    /// Release the blocking layer, fading it out first when configured. The
    /// completion path is idempotent: once the layer is gone further calls
    /// are no-ops, so the deferred teardown may also be invoked "now".
    pub fn release_blocker(&mut self, ctx: &mut ModalCtx, stack: &mut ModalStack, now: bool) {
        if self.blocker.is_none() {
            return;
        }
        if !now && self.options.do_fade() {
            if let Some(layer) = &self.blocker {
                ctx.doc.set_opacity(layer.node(), 0.0);
            }
            ctx.fades.schedule(
                ctx.now + self.options.fade_duration(),
                FadeJob::DestroyBlocker(self.id),
            );
            return;
        }
        if let Some(layer) = self.blocker.take() {
            layer.destroy(ctx.doc);
        }
        stack.recompute_layering(ctx.doc);
        if !stack.is_active() && self.options.scroll_lock {
            ctx.doc.unlock_scroll();
        }
    }

    /// Hide the content. BeforeClose and Close fire synchronously with hide
    /// initiation; AfterClose fires once the hide actually completes, which
    /// without a fade is within the same turn.
    pub fn hide(&mut self, ctx: &mut ModalCtx) {
        ctx.emit(EventKind::BeforeClose, self.content, self.blocker_node(), &self.options);

        if let Some(button) = self.close_button.take() {
            ctx.doc.detach(button);
        }

        let fading = self.options.do_fade();
        if fading {
            ctx.fades.schedule(
                ctx.now + self.options.fade_duration(),
                FadeJob::HideComplete(self.id),
            );
            self.state = LifecycleState::FadingOut;
        }

        let marker = format!("{}-visible", self.options.modal_class);
        ctx.doc.remove_class(self.content, &marker);
        ctx.emit(EventKind::Close, self.content, self.blocker_node(), &self.options);

        if !fading {
            ctx.doc.set_visible(self.content, false);
            ctx.emit(EventKind::AfterClose, self.content, self.blocker_node(), &self.options);
            self.state = LifecycleState::Closed;
        }
    }

    /// Completion of the content's hide animation.
    pub fn hide_complete(&mut self, ctx: &mut ModalCtx) {
        ctx.doc.set_visible(self.content, false);
        ctx.emit(EventKind::AfterClose, self.content, self.blocker_node(), &self.options);
        if self.state == LifecycleState::FadingOut {
            self.state = LifecycleState::Closed;
        }
    }

    // --- spinner ----------------------------------------------------------
    //
    // The loading indicator is independent of the block/show machine and may
    // be active before open() is ever called.

    pub fn show_spinner(&mut self, doc: &mut Document) {
        if !self.options.show_spinner {
            return;
        }
        let spinner = match self.spinner {
            Some(existing) => existing,
            None => {
                let node = doc.create_element("div");
                let class = format!("{}-spinner", self.options.modal_class);
                doc.add_class(node, &class);
                if let Some(markup) = &self.options.spinner_markup {
                    doc.set_markup(node, markup.clone());
                }
                self.spinner = Some(node);
                node
            }
        };
        let body = doc.body();
        doc.append(body, spinner);
        doc.set_visible(spinner, true);
    }

    pub fn hide_spinner(&mut self, doc: &mut Document) {
        if let Some(spinner) = self.spinner {
            doc.detach(spinner);
        }
    }

    pub fn spinner_node(&self) -> Option<NodeId> {
        self.spinner
    }
}
