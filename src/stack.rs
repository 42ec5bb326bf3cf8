use crate::blocker::Placement;
use crate::dom::Document;
use crate::lifecycle::{ModalCtx, ModalId, ModalInstance};
use crate::sched::FadeJob;

/// Process-wide ordered registry of live dialog instances.
///
/// Append-only push, LIFO pop. The stack owns the selection of which
/// blocking layer is current versus behind; a plain value, so tests run
/// against isolated stacks.
#[derive(Default)]
pub struct ModalStack {
    entries: Vec<ModalInstance>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance. Pushing an id that is already stacked is a no-op
    /// safety net, not an error.
    pub fn push(&mut self, instance: ModalInstance) {
        if self.entries.iter().any(|e| e.id() == instance.id()) {
            log::warn!("instance {:?} already stacked, ignoring push", instance.id());
            return;
        }
        log::debug!("push {:?}, depth now {}", instance.id(), self.entries.len() + 1);
        self.entries.push(instance);
    }

    /// Remove and return the last instance, if any.
    pub fn pop(&mut self) -> Option<ModalInstance> {
        let instance = self.entries.pop();
        if let Some(instance) = &instance {
            log::debug!("pop {:?}, depth now {}", instance.id(), self.entries.len());
        }
        instance
    }

    /// Remove a specific instance, wherever it sits in the stack.
    pub fn remove(&mut self, id: ModalId) -> Option<ModalInstance> {
        let index = self.position(id)?;
        Some(self.entries.remove(index))
    }

    pub fn current(&self) -> Option<&ModalInstance> {
        self.entries.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut ModalInstance> {
        self.entries.last_mut()
    }

    pub fn find(&self, id: ModalId) -> Option<&ModalInstance> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn find_mut(&mut self, id: ModalId) -> Option<&mut ModalInstance> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub fn position(&self, id: ModalId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModalInstance> {
        self.entries.iter()
    }

    pub fn is_active(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk the stack top-down and mark the first instance with a live
    /// blocking layer as current, every other live layer as behind.
    ///
    /// Runs after every push/pop and after any layer teardown: fade-out
    /// removal is asynchronous, so a layer can still exist transiently while
    /// its dialog is logically closed.
    pub fn recompute_layering(&mut self, doc: &mut Document) {
        let mut selected = false;
        for instance in self.entries.iter_mut().rev() {
            if let Some(layer) = instance.blocker_mut() {
                let placement = if selected {
                    Placement::Behind
                } else {
                    Placement::Current
                };
                layer.set_placement(doc, placement);
                selected = true;
            }
        }
    }

    /// Run the open sequence for the instance at `index`, interleaving the
    /// layering recompute between blocker creation and the Block
    /// notification. With a fade configured the content reveal is deferred
    /// by `fade_duration × fade_delay_fraction`; otherwise it happens here.
    pub fn open_at(&mut self, index: usize, ctx: &mut ModalCtx) {
        if index >= self.entries.len() {
            return;
        }
        self.entries[index].block_begin(ctx);
        self.recompute_layering(ctx.doc);
        let instance = &mut self.entries[index];
        instance.block_commit(ctx);
        if instance.options().do_fade() {
            let deadline = ctx.now + instance.options().reveal_delay();
            ctx.fades.schedule(deadline, FadeJob::RevealContent(instance.id()));
        } else {
            instance.reveal(ctx);
        }
    }

    /// Run the open sequence for the topmost instance.
    pub fn open_top(&mut self, ctx: &mut ModalCtx) {
        if !self.entries.is_empty() {
            let index = self.entries.len() - 1;
            self.open_at(index, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn instance(doc: &mut Document, raw: u64) -> ModalInstance {
        let content = doc.create_element("div");
        let body = doc.body();
        doc.append(body, content);
        ModalInstance::new(ModalId::from_raw(raw), content, Options::default())
    }

    #[test]
    fn push_pop_is_lifo() {
        let mut doc = Document::new(800, 600);
        let mut stack = ModalStack::new();
        assert!(!stack.is_active());
        assert!(stack.pop().is_none());

        stack.push(instance(&mut doc, 1));
        stack.push(instance(&mut doc, 2));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.current().unwrap().id(), ModalId::from_raw(2));
        assert_eq!(stack.pop().unwrap().id(), ModalId::from_raw(2));
        assert_eq!(stack.pop().unwrap().id(), ModalId::from_raw(1));
        assert!(!stack.is_active());
    }

    #[test]
    fn duplicate_push_is_ignored() {
        let mut doc = Document::new(800, 600);
        let mut stack = ModalStack::new();
        let a = instance(&mut doc, 7);
        let content = a.content();
        stack.push(a);
        stack.push(ModalInstance::new(ModalId::from_raw(7), content, Options::default()));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn remove_targets_an_arbitrary_position() {
        let mut doc = Document::new(800, 600);
        let mut stack = ModalStack::new();
        stack.push(instance(&mut doc, 1));
        stack.push(instance(&mut doc, 2));
        stack.push(instance(&mut doc, 3));

        let removed = stack.remove(ModalId::from_raw(2)).unwrap();
        assert_eq!(removed.id(), ModalId::from_raw(2));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.current().unwrap().id(), ModalId::from_raw(3));
        assert!(stack.remove(ModalId::from_raw(2)).is_none());
    }
}
