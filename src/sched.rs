use std::time::Instant;

use crate::lifecycle::ModalId;

/// A fade completion scheduled for a later turn of the host's event loop.
///
/// Zero-duration transitions never produce a job: they complete
/// synchronously inside the call that would have scheduled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeJob {
    /// The deferred content reveal at `fade_duration × fade_delay_fraction`
    /// after blocking started.
    RevealContent(ModalId),
    /// The blocking layer's fade-in reached full opacity.
    BlockerFadedIn(ModalId),
    /// The content's fade-in reached full opacity.
    ContentFadedIn(ModalId),
    /// The content's hide animation finished; fires the AfterClose
    /// notification.
    HideComplete(ModalId),
    /// The blocking layer's fade-out finished; runs the deferred teardown.
    DestroyBlocker(ModalId),
}

impl FadeJob {
    pub fn modal_id(&self) -> ModalId {
        match *self {
            FadeJob::RevealContent(id)
            | FadeJob::BlockerFadedIn(id)
            | FadeJob::ContentFadedIn(id)
            | FadeJob::HideComplete(id)
            | FadeJob::DestroyBlocker(id) => id,
        }
    }
}

/// Pending fade completions, polled cooperatively by the service.
///
/// Jobs fire in deadline order; ties resolve in scheduling order so two
/// completions due on the same tick keep their causal sequence.
#[derive(Default)]
pub struct FadeScheduler {
    queue: Vec<(Instant, u64, FadeJob)>,
    seq: u64,
}

impl FadeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Instant, job: FadeJob) {
        log::debug!("schedule {:?} at {:?}", job, deadline);
        self.queue.push((deadline, self.seq, job));
        self.seq += 1;
    }

    /// Remove and return every job whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<FadeJob> {
        let mut due: Vec<(Instant, u64, FadeJob)> = Vec::new();
        self.queue.retain(|&(deadline, seq, job)| {
            if deadline <= now {
                due.push((deadline, seq, job));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(deadline, seq, _)| (deadline, seq));
        due.into_iter().map(|(_, _, job)| job).collect()
    }

    pub fn has_jobs_for(&self, id: ModalId) -> bool {
        self.queue.iter().any(|&(_, _, job)| job.modal_id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
