pub mod blocker;
pub mod dom;
pub mod event;
pub mod focus;
pub mod lifecycle;
pub mod loader;
pub mod options;
pub mod resolver;
pub mod runtime;
pub mod sched;
pub mod stack;

pub use blocker::{BlockingLayer, Placement};
pub use dom::{Document, NodeId, Rect};
pub use event::{EventBus, EventKind, ModalEvent, REL_CLOSE, REL_OPEN};
pub use focus::{TrapAction, TrapDirection};
pub use lifecycle::{LifecycleState, ModalCtx, ModalId, ModalInstance};
pub use loader::{ContentLoader, HttpLoader};
pub use options::Options;
pub use resolver::ContentSource;
pub use runtime::{KeyInput, ModalRuntime};
pub use sched::{FadeJob, FadeScheduler};
pub use stack::ModalStack;

use std::sync::Mutex;

use once_cell::sync::OnceCell;

// Global ModalRuntime instance. The engine itself is a plain value, so
// hosts that want isolation (or tests) construct their own instead.
static RUNTIME: OnceCell<Mutex<ModalRuntime>> = OnceCell::new();

/// Initialize the global ModalRuntime (called once at startup).
pub fn init_global_runtime(runtime: ModalRuntime) {
    RUNTIME
        .set(Mutex::new(runtime))
        .unwrap_or_else(|_| panic!("ModalRuntime already initialized"));
}

/// Get a reference to the global ModalRuntime.
pub fn global_runtime() -> &'static Mutex<ModalRuntime> {
    RUNTIME.get().expect("ModalRuntime not initialized")
}
