pub mod config_bridge;
pub mod engine_client;
pub mod evolution_runner;
pub mod persistence;

pub use config_bridge::EngineBundle;
pub use engine_client::{
    EngineMessage, EngineSession, ProcessEngine, Request, SearchEngine, SessionEvent, PROTOCOL_VERSION,
};
pub use evolution_runner::{
    CancelToken, EvolutionResult, EvolutionRunner, NoopObserver, Orchestrator, ProgressUpdate, RunObserver,
    RunOutcome, RunState, RunnerSettings,
};
pub use persistence::{load_outcome, save_outcome, RunRecord, FORMAT_VERSION};
