use super::config_bridge::EngineBundle;
use super::engine_client::{EngineMessage, EngineSession, Request, SearchEngine, SessionEvent, PROTOCOL_VERSION};
use crate::config::{ConfigSection, EngineConfig, RunConfig};
use crate::data::{DatConnector, Dataset};
use crate::encoding::SymbolPartition;
use crate::engines::generation::{Entry, History, Individual};
use crate::error::{Result, TinyGpError};
use rand::Rng;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Configured,
    Loaded,
    Dispatched,
    Collecting,
    Completed,
    Failed(String),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Configured => f.write_str("configured"),
            RunState::Loaded => f.write_str("loaded"),
            RunState::Dispatched => f.write_str("dispatched"),
            RunState::Collecting => f.write_str("collecting"),
            RunState::Completed => f.write_str("completed"),
            RunState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Hooks called from the collection loop.
pub trait RunObserver: Send {
    fn on_state_change(&mut self, _state: &RunState) {}
    fn on_generation(&mut self, _entry: &Entry) {}
}

pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Shared flag checked between engine frames.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    /// Bound on the whole run. `None` waits for the engine indefinitely.
    pub timeout: Option<Duration>,
    /// How long to wait for a frame before checking cancellation again.
    pub poll_interval: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl RunnerSettings {
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self {
            timeout: config.timeout(),
            ..Self::default()
        }
    }
}

/// A completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Configuration as dispatched, with the seed resolved.
    pub config: RunConfig,
    pub dataset: Dataset,
    pub constant_pool: Vec<f64>,
    pub history: History,
    pub solved: bool,
}

impl RunOutcome {
    /// The last generation's champion.
    pub fn best_individual(&self) -> Option<&Individual> {
        self.history.best_individual()
    }

    pub fn seed(&self) -> Option<u64> {
        self.config.seed
    }

    pub fn partition(&self) -> Result<SymbolPartition> {
        self.config.partition(self.dataset.variable_count())
    }
}

/// Drives one configured run against a search engine.
pub struct Orchestrator<E: SearchEngine> {
    engine: E,
    settings: RunnerSettings,
    state: Option<RunState>,
    config: Option<RunConfig>,
    dataset: Option<Dataset>,
}

impl<E: SearchEngine> Orchestrator<E> {
    pub fn new(engine: E, settings: RunnerSettings) -> Self {
        Self {
            engine,
            settings,
            state: None,
            config: None,
            dataset: None,
        }
    }

    /// `None` until a configuration has been accepted.
    pub fn state(&self) -> Option<&RunState> {
        self.state.as_ref()
    }

    pub fn config(&self) -> Option<&RunConfig> {
        self.config.as_ref()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Validates and stores `config`. Any previously loaded dataset must be
    /// loaded again.
    pub fn configure(&mut self, config: RunConfig) -> Result<()> {
        config.validate()?;
        log::info!(
            "Run configured: {} generation(s), population {}, operations {:?}",
            config.generations,
            config.population_size,
            config.operations
        );
        self.config = Some(config);
        self.dataset = None;
        self.state = Some(RunState::Configured);
        Ok(())
    }

    pub fn load_dataset<P: AsRef<Path>>(&mut self, path: P) -> Result<&Dataset> {
        let dataset = DatConnector::load(path)?;
        self.use_dataset(dataset)
    }

    /// Accepts in-memory fitness cases. Fails if the configured constant pool
    /// leaves no room for the dataset's variables.
    pub fn use_dataset(&mut self, dataset: Dataset) -> Result<&Dataset> {
        let config = self.config.as_ref().ok_or_else(|| {
            TinyGpError::Configuration("Configure the run before loading fitness cases".to_string())
        })?;
        config.partition(dataset.variable_count())?;

        self.state = Some(RunState::Loaded);
        Ok(self.dataset.insert(dataset))
    }

    /// Configures, loads and runs in one call.
    pub fn execute(&mut self, config: RunConfig, dataset: Dataset) -> Result<RunOutcome> {
        self.configure(config)?;
        self.use_dataset(dataset)?;
        self.run(&CancelToken::new(), &mut NoopObserver)
    }

    /// Dispatches the loaded run to the engine exactly once and collects its
    /// history. Partial history is discarded on failure or cancellation.
    pub fn run(&mut self, cancel: &CancelToken, observer: &mut dyn RunObserver) -> Result<RunOutcome> {
        let (mut config, dataset) = match (&self.config, &self.dataset) {
            (Some(config), Some(dataset)) => (config.clone(), dataset.clone()),
            _ => {
                return Err(TinyGpError::Configuration(
                    "Run needs a configuration and fitness cases".to_string(),
                ))
            }
        };
        let partition = config.partition(dataset.variable_count())?;

        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        config.seed = Some(seed);
        let request = Request::evolve(EngineBundle::build(&config, seed, &partition, &dataset));

        self.transition(RunState::Dispatched, observer);
        log::info!(
            "Dispatching run: {} case(s), {} variable(s), seed {}",
            dataset.case_count(),
            dataset.variable_count(),
            seed
        );

        let mut collection = Collection::default();
        let result = match self.engine.dispatch(&request) {
            Ok(mut session) => {
                let result = self.collect(
                    session.as_mut(),
                    &partition,
                    config.max_length,
                    &mut collection,
                    cancel,
                    observer,
                );
                session.terminate();
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(solved) => {
                self.transition(RunState::Completed, observer);
                log::info!(
                    "Run completed after {} generation(s){}",
                    collection.history.len(),
                    if solved { ", goal fitness reached" } else { "" }
                );
                Ok(RunOutcome {
                    config,
                    dataset,
                    constant_pool: collection.constant_pool.unwrap_or_default(),
                    history: collection.history,
                    solved,
                })
            }
            Err(TinyGpError::Cancelled) => {
                log::info!("Run cancelled");
                self.transition(RunState::Failed("cancelled".to_string()), observer);
                Err(TinyGpError::Cancelled)
            }
            Err(cause) => {
                let last_generation = collection.history.last().map(|e| e.generation);
                log::error!("Run failed: {}", cause);
                self.transition(RunState::Failed(cause.to_string()), observer);
                Err(TinyGpError::RunAborted {
                    last_generation,
                    cause: Box::new(cause),
                })
            }
        }
    }

    fn collect(
        &mut self,
        session: &mut dyn EngineSession,
        partition: &SymbolPartition,
        max_length: usize,
        collection: &mut Collection,
        cancel: &CancelToken,
        observer: &mut dyn RunObserver,
    ) -> Result<bool> {
        let deadline = self.settings.timeout.map(|t| Instant::now() + t);

        loop {
            if cancel.is_cancelled() {
                return Err(TinyGpError::Cancelled);
            }
            let wait = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(TinyGpError::Engine(format!(
                            "Run timed out after {:?}",
                            self.settings.timeout.unwrap_or_default()
                        )));
                    }
                    remaining.min(self.settings.poll_interval)
                }
                None => self.settings.poll_interval,
            };

            let message = match session.next_event(wait)? {
                SessionEvent::Idle => continue,
                SessionEvent::Closed => {
                    return Err(TinyGpError::Engine(
                        "Engine closed its output before finishing".to_string(),
                    ))
                }
                SessionEvent::Frame(message) => message,
            };

            match message {
                EngineMessage::Started { version, constant_pool } => {
                    if version != PROTOCOL_VERSION {
                        return Err(TinyGpError::Engine(format!(
                            "Engine speaks protocol version {}, expected {}",
                            version, PROTOCOL_VERSION
                        )));
                    }
                    if collection.constant_pool.is_some() {
                        return Err(TinyGpError::Engine("Duplicate started frame".to_string()));
                    }
                    log::debug!("Engine started with {} constant(s)", constant_pool.len());
                    collection.constant_pool = Some(constant_pool);
                    self.transition(RunState::Collecting, observer);
                }
                EngineMessage::Generation {
                    gen,
                    avg_fitness,
                    best_fitness,
                    avg_size,
                    best_program,
                } => {
                    let pool = collection.constant_pool.as_deref().ok_or_else(|| {
                        TinyGpError::Engine("Generation frame before started frame".to_string())
                    })?;
                    if best_program.len() > max_length {
                        return Err(TinyGpError::Decode(format!(
                            "generation {} program has {} symbols, above the maximum length {}",
                            gen,
                            best_program.len(),
                            max_length
                        )));
                    }
                    let individual = Individual::decode(best_program, pool, partition)?;
                    let entry = Entry::new(gen, avg_fitness, best_fitness, avg_size, individual);
                    log::debug!(
                        "Generation {}: best fitness {}, average fitness {}",
                        gen,
                        best_fitness,
                        avg_fitness
                    );
                    observer.on_generation(&entry);
                    collection.history.append(entry);
                }
                EngineMessage::Finished { solved } => {
                    if collection.constant_pool.is_none() {
                        return Err(TinyGpError::Engine("Finished frame before started frame".to_string()));
                    }
                    return Ok(solved);
                }
                EngineMessage::Failed { message } => {
                    return Err(TinyGpError::Engine(message));
                }
            }
        }
    }

    fn transition(&mut self, state: RunState, observer: &mut dyn RunObserver) {
        log::info!("Run state: {}", state);
        observer.on_state_change(&state);
        self.state = Some(state);
    }
}

#[derive(Default)]
struct Collection {
    constant_pool: Option<Vec<f64>>,
    history: History,
}

/// Progress update from the runner thread
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub generation: Option<u32>,
    pub total_generations: u32,
    pub best_fitness: Option<f64>,
    pub state: Option<RunState>,
    pub status: String,
}

pub type EvolutionResult = Result<RunOutcome>;

struct ChannelObserver {
    progress_tx: Sender<ProgressUpdate>,
    total_generations: u32,
}

impl RunObserver for ChannelObserver {
    fn on_state_change(&mut self, state: &RunState) {
        let _ = self.progress_tx.send(ProgressUpdate {
            generation: None,
            total_generations: self.total_generations,
            best_fitness: None,
            state: Some(state.clone()),
            status: format!("Run {}", state),
        });
    }

    fn on_generation(&mut self, entry: &Entry) {
        let _ = self.progress_tx.send(ProgressUpdate {
            generation: Some(entry.generation),
            total_generations: self.total_generations,
            best_fitness: Some(entry.best_fitness),
            state: None,
            status: format!(
                "Generation {}/{} - Best: {:.4}",
                entry.generation, self.total_generations, entry.best_fitness
            ),
        });
    }
}

/// Runs an [`Orchestrator`] on a background thread.
pub struct EvolutionRunner {
    handle: Option<JoinHandle<EvolutionResult>>,
    progress_rx: Receiver<ProgressUpdate>,
    cancel: CancelToken,
}

impl EvolutionRunner {
    pub fn start<E>(
        engine: E,
        settings: RunnerSettings,
        config: RunConfig,
        dataset: Dataset,
    ) -> Result<Self>
    where
        E: SearchEngine + Send + 'static,
    {
        let (progress_tx, progress_rx) = channel();
        let cancel = CancelToken::new();
        let thread_cancel = cancel.clone();

        // Decoding and rendering recurse per node; long programs need more
        // than the default stack.
        let handle = thread::Builder::new()
            .name("tinygp-run".to_string())
            .stack_size(16 * 1024 * 1024)
            .spawn(move || {
                let mut observer = ChannelObserver {
                    progress_tx,
                    total_generations: config.generations,
                };
                let mut orchestrator = Orchestrator::new(engine, settings);
                orchestrator.configure(config)?;
                orchestrator.use_dataset(dataset)?;
                orchestrator.run(&thread_cancel, &mut observer)
            })?;

        Ok(Self {
            handle: Some(handle),
            progress_rx,
            cancel,
        })
    }

    /// Poll for progress updates (non-blocking)
    pub fn poll_progress(&mut self) -> Option<ProgressUpdate> {
        self.progress_rx.try_recv().ok()
    }

    /// Results once the run has finished; `None` while it is still going or
    /// after the results were taken.
    pub fn try_get_results(&mut self) -> Option<EvolutionResult> {
        let handle = self.handle.take()?;
        if handle.is_finished() {
            Some(Self::join(handle))
        } else {
            self.handle = Some(handle);
            None
        }
    }

    /// Blocks until the run ends.
    pub fn wait(mut self) -> EvolutionResult {
        match self.handle.take() {
            Some(handle) => Self::join(handle),
            None => Err(TinyGpError::Engine("Results were already taken".to_string())),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    fn join(handle: JoinHandle<EvolutionResult>) -> EvolutionResult {
        handle
            .join()
            .unwrap_or_else(|_| Err(TinyGpError::Engine("Run thread panicked".to_string())))
    }
}

impl Drop for EvolutionRunner {
    fn drop(&mut self) {
        self.cancel();
    }
}
