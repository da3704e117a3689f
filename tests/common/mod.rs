#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tinygp::services::{EngineMessage, EngineSession, Request, SearchEngine, SessionEvent};
use tinygp::{Result, TinyGpError};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Replays a fixed list of events for every dispatch and records requests.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    events: Vec<SessionEvent>,
    fail_dispatch: bool,
    pub requests: Arc<Mutex<Vec<Request>>>,
    pub terminated: Arc<AtomicBool>,
}

impl ScriptedEngine {
    pub fn new(events: Vec<SessionEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn from_frames(frames: Vec<EngineMessage>) -> Self {
        Self::new(frames.into_iter().map(SessionEvent::Frame).collect())
    }

    pub fn failing_dispatch() -> Self {
        Self {
            fail_dispatch: true,
            ..Self::default()
        }
    }

    pub fn dispatch_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn was_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl SearchEngine for ScriptedEngine {
    fn dispatch(&self, request: &Request) -> Result<Box<dyn EngineSession>> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_dispatch {
            return Err(TinyGpError::Engine("engine unavailable".to_string()));
        }
        Ok(Box::new(ScriptedSession {
            events: self.events.iter().cloned().collect(),
            terminated: Arc::clone(&self.terminated),
        }))
    }
}

struct ScriptedSession {
    events: VecDeque<SessionEvent>,
    terminated: Arc<AtomicBool>,
}

impl EngineSession for ScriptedSession {
    fn next_event(&mut self, wait: Duration) -> Result<SessionEvent> {
        match self.events.pop_front() {
            Some(event) => Ok(event),
            // An exhausted script behaves like an engine that never answers.
            None => {
                std::thread::sleep(wait);
                Ok(SessionEvent::Idle)
            }
        }
    }

    fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

/// Pool where code `c` resolves to `c / 2`.
pub fn constant_pool() -> Vec<f64> {
    (0..110).map(|c| c as f64 / 2.0).collect()
}

pub fn started() -> EngineMessage {
    EngineMessage::Started {
        version: 1,
        constant_pool: constant_pool(),
    }
}

pub fn generation(gen: u32, best_fitness: f64, best_program: Vec<u32>) -> EngineMessage {
    EngineMessage::Generation {
        gen,
        avg_fitness: best_fitness * 4.0,
        best_fitness,
        avg_size: 6.0,
        best_program,
    }
}

pub fn finished(solved: bool) -> EngineMessage {
    EngineMessage::Finished { solved }
}
