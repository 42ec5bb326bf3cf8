#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Poll;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use dockedmodal::{ContentLoader, Document, EventKind, ModalRuntime, NodeId};

/// Loader that resolves immediately with canned markup.
pub struct OkLoader(pub String);

#[async_trait]
impl ContentLoader for OkLoader {
    async fn get(&self, _url: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Loader that fails immediately.
pub struct FailLoader;

#[async_trait]
impl ContentLoader for FailLoader {
    async fn get(&self, _url: &str) -> Result<String> {
        Err(anyhow!("connection refused"))
    }
}

/// Loader that stays pending until released, so tests can interleave other
/// work with an in-flight fetch.
pub struct GateLoader {
    release: Arc<AtomicBool>,
    fail: bool,
    html: String,
}

impl GateLoader {
    pub fn new(html: &str) -> (Self, Arc<AtomicBool>) {
        let release = Arc::new(AtomicBool::new(false));
        (
            Self {
                release: release.clone(),
                fail: false,
                html: html.to_string(),
            },
            release,
        )
    }

    pub fn failing() -> (Self, Arc<AtomicBool>) {
        let release = Arc::new(AtomicBool::new(false));
        (
            Self {
                release: release.clone(),
                fail: true,
                html: String::new(),
            },
            release,
        )
    }
}

#[async_trait]
impl ContentLoader for GateLoader {
    async fn get(&self, _url: &str) -> Result<String> {
        let release = self.release.clone();
        futures::future::poll_fn(move |_cx| {
            if release.load(Ordering::SeqCst) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;
        if self.fail {
            Err(anyhow!("fetch failed"))
        } else {
            Ok(self.html.clone())
        }
    }
}

pub fn runtime_with(loader: impl ContentLoader + 'static) -> ModalRuntime {
    let _ = env_logger::builder().is_test(true).try_init();
    ModalRuntime::new(Document::new(1280, 720), Arc::new(loader))
}

pub fn runtime() -> ModalRuntime {
    runtime_with(FailLoader)
}

/// Record every notification's kind in firing order.
pub fn record_events(runtime: &mut ModalRuntime) -> Arc<Mutex<Vec<EventKind>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    runtime
        .events_mut()
        .subscribe_all(move |event| sink.lock().unwrap().push(event.kind));
    log
}

pub fn recorded(log: &Arc<Mutex<Vec<EventKind>>>) -> Vec<EventKind> {
    log.lock().unwrap().clone()
}

/// Build a plain div attached to the body, usable as direct dialog content.
pub fn body_div(runtime: &mut ModalRuntime) -> NodeId {
    let doc = runtime.doc_mut();
    let node = doc.create_element("div");
    let body = doc.body();
    doc.append(body, node);
    node
}

/// Build an anchor attached to the body pointing at `href`.
pub fn anchor(runtime: &mut ModalRuntime, href: &str) -> NodeId {
    let doc = runtime.doc_mut();
    let node = doc.create_element("a");
    doc.set_attr(node, "href", href);
    let body = doc.body();
    doc.append(body, node);
    node
}

/// Exactly one stacked instance with a live layer may be current, and it
/// must be the topmost one with a layer.
pub fn assert_layering(runtime: &ModalRuntime) {
    let doc = runtime.doc();
    let layers: Vec<NodeId> = runtime
        .stack()
        .iter()
        .filter_map(|instance| instance.blocker_node())
        .collect();
    for (index, &layer) in layers.iter().enumerate() {
        let should_be_current = index == layers.len() - 1;
        assert_eq!(
            doc.has_class(layer, "current"),
            should_be_current,
            "layer {index} of {} has the wrong current marker",
            layers.len()
        );
        assert_eq!(
            doc.has_class(layer, "behind"),
            !should_be_current,
            "layer {index} of {} has the wrong behind marker",
            layers.len()
        );
    }
}
