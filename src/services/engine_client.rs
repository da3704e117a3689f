//! Client side of the external search engine.
//!
//! The engine runs as a child process speaking newline-delimited JSON: one
//! [`Request`] line on its stdin, then a stream of [`EngineMessage`] frames
//! on its stdout. Anything it writes to stderr is forwarded to the log.

use super::config_bridge::EngineBundle;
use crate::config::EngineConfig;
use crate::error::{Result, TinyGpError};
use crate::types::RawProgram;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Evolve { version: u32, bundle: EngineBundle },
}

impl Request {
    pub fn evolve(bundle: EngineBundle) -> Self {
        Request::Evolve {
            version: PROTOCOL_VERSION,
            bundle,
        }
    }

    pub fn bundle(&self) -> &EngineBundle {
        match self {
            Request::Evolve { bundle, .. } => bundle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMessage {
    /// First frame of every run.
    Started { version: u32, constant_pool: Vec<f64> },
    Generation {
        gen: u32,
        avg_fitness: f64,
        best_fitness: f64,
        avg_size: f64,
        best_program: RawProgram,
    },
    Finished { solved: bool },
    Failed { message: String },
}

/// What a session produced while the caller waited.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Frame(EngineMessage),
    /// Nothing arrived within the wait.
    Idle,
    /// The engine closed its output.
    Closed,
}

pub trait SearchEngine {
    /// Starts one engine run for `request`.
    fn dispatch(&self, request: &Request) -> Result<Box<dyn EngineSession>>;
}

/// One in-flight engine run.
pub trait EngineSession: Send {
    /// Waits up to `wait` for the next frame.
    fn next_event(&mut self, wait: Duration) -> Result<SessionEvent>;

    /// Stops the engine and releases the channel. Safe to call twice.
    fn terminate(&mut self);
}

/// Runs the engine as a child process.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        if config.command.is_empty() {
            return Err(TinyGpError::Configuration(
                "No search engine command configured".to_string(),
            ));
        }
        Ok(Self::new(&config.command).with_args(config.args.iter().cloned()))
    }
}

impl SearchEngine for ProcessEngine {
    fn dispatch(&self, request: &Request) -> Result<Box<dyn EngineSession>> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TinyGpError::Engine(format!(
                    "Failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;
        log::info!("Started search engine {} (pid {})", self.program.display(), child.id());

        let (stdin, stdout, stderr) = match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => {
                kill(&mut child);
                return Err(TinyGpError::Engine("Engine pipes unavailable".to_string()));
            }
        };

        // Readers start before the request is written so a chatty engine
        // cannot fill its pipes while we block on stdin.
        let (frame_tx, frames) = channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let frame = match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => serde_json::from_str::<EngineMessage>(&line).map_err(|e| {
                        TinyGpError::Engine(format!("Malformed frame {:?}: {}", line, e))
                    }),
                    Err(e) => Err(TinyGpError::Engine(format!("Failed to read engine output: {}", e))),
                };
                let stop = frame.is_err();
                if frame_tx.send(frame).is_err() || stop {
                    break;
                }
            }
        });
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(std::result::Result::ok) {
                log::debug!("engine: {}", line);
            }
        });

        let mut session = ProcessSession {
            child,
            frames,
            finished: false,
        };

        // Dropping stdin closes it: the bundle is sent exactly once.
        let mut stdin = stdin;
        if let Err(e) = stdin.write_all(line.as_bytes()).and_then(|_| stdin.flush()) {
            session.terminate();
            return Err(TinyGpError::Engine(format!("Failed to send request: {}", e)));
        }
        drop(stdin);

        Ok(Box::new(session))
    }
}

struct ProcessSession {
    child: Child,
    frames: Receiver<Result<EngineMessage>>,
    finished: bool,
}

impl EngineSession for ProcessSession {
    fn next_event(&mut self, wait: Duration) -> Result<SessionEvent> {
        match self.frames.recv_timeout(wait) {
            Ok(Ok(message)) => Ok(SessionEvent::Frame(message)),
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Ok(SessionEvent::Idle),
            Err(RecvTimeoutError::Disconnected) => {
                if let Ok(Some(status)) = self.child.try_wait() {
                    log::debug!("Search engine exited with {}", status);
                }
                Ok(SessionEvent::Closed)
            }
        }
    }

    fn terminate(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        kill(&mut self.child);
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn kill(child: &mut Child) {
    if let Ok(None) = child.try_wait() {
        if let Err(e) = child.kill() {
            log::warn!("Failed to kill search engine: {}", e);
        }
    }
    let _ = child.wait();
}
