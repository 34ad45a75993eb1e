//! Event emitter for the Runner (`.on`/`.off`, `.stream()` chunk shape).
//!
//! A `HashMap<EventKind, Vec<ListenerFn>>`, the same shape spec.md §9's
//! design notes call for in place of a generic proxy/property-access
//! mechanism Rust has no equivalent of.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::result::RunnerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Data,
    Stdout,
    Stderr,
    End,
    Exit,
    Error,
}

/// One byte chunk observed from a stage, as delivered to `.stream()` and the
/// `data` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub stream: ChunkStream,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStream {
    Stdout,
    Stderr,
}

/// Payload handed to a listener, shaped per event per spec.md §4.4's table.
#[derive(Clone)]
pub enum EventPayload {
    Data(Chunk),
    Bytes(Vec<u8>),
    End(RunnerResult),
    Exit(i32),
    Error(String),
}

pub type ListenerFn = Arc<dyn Fn(EventPayload) + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<Mutex<HashMap<EventKind, Vec<ListenerFn>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: EventKind, f: ListenerFn) {
        self.listeners.lock().expect("listener lock poisoned").entry(kind).or_default().push(f);
    }

    /// Removes every listener registered for `kind` that points at the same
    /// allocation as `f` (`Arc::ptr_eq`) — the closest Rust analogue of the
    /// host language's by-reference listener removal.
    pub fn off(&self, kind: EventKind, f: &ListenerFn) {
        if let Some(v) = self.listeners.lock().expect("listener lock poisoned").get_mut(&kind) {
            v.retain(|existing| !Arc::ptr_eq(existing, f));
        }
    }

    pub fn emit(&self, kind: EventKind, payload: EventPayload) {
        let snapshot = self.listeners.lock().expect("listener lock poisoned").get(&kind).cloned();
        if let Some(fns) = snapshot {
            for f in fns {
                f(payload.clone());
            }
        }
    }

    pub fn has_listeners(&self) -> bool {
        self.listeners.lock().expect("listener lock poisoned").values().any(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emits_to_registered_listener() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        emitter.on(EventKind::Exit, Arc::new(move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
        }));
        emitter.emit(EventKind::Exit, EventPayload::Exit(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_removes_listener() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let listener: ListenerFn = Arc::new(move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
        });
        emitter.on(EventKind::Exit, listener.clone());
        emitter.off(EventKind::Exit, &listener);
        emitter.emit(EventKind::Exit, EventPayload::Exit(0));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
