mod common;

use common::{finished, generation, init_logging, started, ScriptedEngine};
use std::time::Duration;
use tinygp::config::RunConfig;
use tinygp::data::Dataset;
use tinygp::engines::generation::Entry;
use tinygp::services::{
    CancelToken, EngineMessage, EvolutionRunner, Orchestrator, RunObserver, RunState, RunnerSettings, SessionEvent,
};
use tinygp::TinyGpError;

fn dataset() -> Dataset {
    // y = x + 2.5
    Dataset::new(1, vec![vec![0.0, 2.5], vec![1.0, 3.5], vec![2.0, 4.5]]).unwrap()
}

fn config() -> RunConfig {
    RunConfig {
        generations: 3,
        population_size: 50,
        seed: Some(11),
        ..RunConfig::default()
    }
}

fn fast_settings() -> RunnerSettings {
    RunnerSettings {
        timeout: None,
        poll_interval: Duration::from_millis(5),
    }
}

/// Three generations converging on `X1 + 2.5` (codes 110, 0, 5).
fn converging_frames() -> Vec<EngineMessage> {
    vec![
        started(),
        generation(0, 9.0, vec![0]),
        generation(1, 3.0, vec![112, 0, 4]),
        generation(2, 0.0, vec![110, 0, 5]),
        finished(true),
    ]
}

#[derive(Default)]
struct Recorder {
    states: Vec<RunState>,
    generations: Vec<u32>,
    cancel_after_first: Option<CancelToken>,
}

impl RunObserver for Recorder {
    fn on_state_change(&mut self, state: &RunState) {
        self.states.push(state.clone());
    }

    fn on_generation(&mut self, entry: &Entry) {
        self.generations.push(entry.generation);
        if let Some(token) = &self.cancel_after_first {
            token.cancel();
        }
    }
}

#[test]
fn test_run_collects_history_in_order() -> anyhow::Result<()> {
    init_logging();
    let engine = ScriptedEngine::from_frames(converging_frames());
    let mut orchestrator = Orchestrator::new(engine.clone(), fast_settings());

    orchestrator.configure(config())?;
    assert_eq!(orchestrator.state(), Some(&RunState::Configured));
    orchestrator.use_dataset(dataset())?;
    assert_eq!(orchestrator.state(), Some(&RunState::Loaded));

    let mut recorder = Recorder::default();
    let outcome = orchestrator.run(&CancelToken::new(), &mut recorder)?;

    assert_eq!(outcome.history.generations(), vec![0, 1, 2]);
    assert_eq!(outcome.history.best_fitness(), vec![9.0, 3.0, 0.0]);
    assert!(outcome.solved);
    assert_eq!(outcome.seed(), Some(11));
    assert_eq!(outcome.constant_pool.len(), 110);

    let best = outcome.best_individual().expect("history is not empty");
    assert_eq!(best.render(), "(X1 + 2.5)");
    assert_eq!(best.evaluate(&[4.0])?, 6.5);

    assert_eq!(
        recorder.states,
        vec![RunState::Dispatched, RunState::Collecting, RunState::Completed]
    );
    assert_eq!(recorder.generations, vec![0, 1, 2]);
    assert_eq!(orchestrator.state(), Some(&RunState::Completed));
    assert_eq!(engine.dispatch_count(), 1);
    assert!(engine.was_terminated());
    Ok(())
}

#[test]
fn test_best_individual_is_last_not_fittest() -> anyhow::Result<()> {
    let engine = ScriptedEngine::from_frames(vec![
        started(),
        generation(0, 0.5, vec![110, 0, 5]),
        generation(1, 2.0, vec![0]),
        finished(false),
    ]);
    let outcome = Orchestrator::new(engine, fast_settings()).execute(config(), dataset())?;

    assert_eq!(outcome.best_individual().map(|i| i.render()), Some("X1".to_string()));
    assert_eq!(outcome.history.best_overall().map(|e| e.generation), Some(0));
    assert!(!outcome.solved);
    Ok(())
}

#[test]
fn test_request_carries_bundle() -> anyhow::Result<()> {
    let engine = ScriptedEngine::from_frames(converging_frames());
    Orchestrator::new(engine.clone(), fast_settings()).execute(config(), dataset())?;

    let request = engine.last_request().expect("request recorded");
    let bundle = request.bundle();
    assert_eq!(bundle.seed, 11);
    assert_eq!(bundle.generations, 3);
    assert_eq!(bundle.variable_count, 1);
    assert_eq!(bundle.fitness_cases, 3);
    assert_eq!(bundle.operator_base, 110);
    assert_eq!(bundle.binary_operator_end, 113);
    assert_eq!(bundle.operator_end, 113);
    assert_eq!(bundle.targets, vec![0.0, 2.5, 1.0, 3.5, 2.0, 4.5]);

    let json = serde_json::to_value(&request)?;
    assert_eq!(json["type"], "evolve");
    assert_eq!(json["version"], 1);
    assert_eq!(json["bundle"]["operator_codes"]["DIV"], 113);
    Ok(())
}

#[test]
fn test_missing_seed_is_resolved_before_dispatch() -> anyhow::Result<()> {
    let engine = ScriptedEngine::from_frames(converging_frames());
    let config = RunConfig {
        seed: None,
        ..config()
    };
    let outcome = Orchestrator::new(engine.clone(), fast_settings()).execute(config, dataset())?;

    let dispatched = engine.last_request().expect("request recorded").bundle().seed;
    assert_eq!(outcome.seed(), Some(dispatched));
    Ok(())
}

#[test]
fn test_decode_failure_aborts_with_last_generation() {
    init_logging();
    let engine = ScriptedEngine::from_frames(vec![
        started(),
        generation(0, 9.0, vec![0]),
        generation(1, 3.0, vec![110, 0]),
        generation(2, 0.0, vec![110, 0, 5]),
        finished(true),
    ]);
    let mut orchestrator = Orchestrator::new(engine.clone(), fast_settings());
    let err = orchestrator.execute(config(), dataset()).unwrap_err();

    match &err {
        TinyGpError::RunAborted { last_generation, cause } => {
            assert_eq!(*last_generation, Some(0));
            assert!(matches!(**cause, TinyGpError::Decode(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(orchestrator.state(), Some(RunState::Failed(_))));
    assert!(engine.was_terminated());
}

#[test]
fn test_engine_failure_frame_is_fatal() {
    let engine = ScriptedEngine::from_frames(vec![
        started(),
        EngineMessage::Failed {
            message: "out of memory".to_string(),
        },
    ]);
    let err = Orchestrator::new(engine, fast_settings())
        .execute(config(), dataset())
        .unwrap_err();

    assert!(matches!(err.cause(), TinyGpError::Engine(m) if m == "out of memory"));
    assert!(err.to_string().contains("last collected generation: none"));
}

#[test]
fn test_stream_closed_before_finish() {
    let engine = ScriptedEngine::new(vec![
        SessionEvent::Frame(started()),
        SessionEvent::Frame(generation(0, 1.0, vec![0])),
        SessionEvent::Closed,
    ]);
    let err = Orchestrator::new(engine, fast_settings())
        .execute(config(), dataset())
        .unwrap_err();

    assert!(matches!(err, TinyGpError::RunAborted { last_generation: Some(0), .. }));
    assert!(matches!(err.cause(), TinyGpError::Engine(_)));
}

#[test]
fn test_protocol_violations() {
    let cases = vec![
        vec![generation(0, 1.0, vec![0]), finished(false)],
        vec![started(), started(), finished(false)],
        vec![
            EngineMessage::Started {
                version: 2,
                constant_pool: vec![],
            },
            finished(false),
        ],
        vec![finished(true)],
    ];

    for frames in cases {
        let err = Orchestrator::new(ScriptedEngine::from_frames(frames), fast_settings())
            .execute(config(), dataset())
            .unwrap_err();
        assert!(matches!(err.cause(), TinyGpError::Engine(_)), "unexpected: {err}");
    }
}

#[test]
fn test_dispatch_failure_is_not_retried() {
    let engine = ScriptedEngine::failing_dispatch();
    let err = Orchestrator::new(engine.clone(), fast_settings())
        .execute(config(), dataset())
        .unwrap_err();

    assert!(matches!(err, TinyGpError::RunAborted { last_generation: None, .. }));
    assert_eq!(engine.dispatch_count(), 1);
}

#[test]
fn test_cancellation_discards_history() {
    let engine = ScriptedEngine::from_frames(converging_frames());
    let mut orchestrator = Orchestrator::new(engine.clone(), fast_settings());
    orchestrator.configure(config()).unwrap();
    orchestrator.use_dataset(dataset()).unwrap();

    let token = CancelToken::new();
    let mut recorder = Recorder {
        cancel_after_first: Some(token.clone()),
        ..Recorder::default()
    };
    let err = orchestrator.run(&token, &mut recorder).unwrap_err();

    assert!(matches!(err, TinyGpError::Cancelled));
    assert_eq!(recorder.generations, vec![0]);
    assert!(engine.was_terminated());
    assert_eq!(
        orchestrator.state(),
        Some(&RunState::Failed("cancelled".to_string()))
    );
}

#[test]
fn test_timeout_bounds_silent_engine() {
    // Only the started frame ever arrives.
    let engine = ScriptedEngine::from_frames(vec![started()]);
    let settings = RunnerSettings {
        timeout: Some(Duration::from_millis(100)),
        poll_interval: Duration::from_millis(10),
    };
    let err = Orchestrator::new(engine.clone(), settings)
        .execute(config(), dataset())
        .unwrap_err();

    assert!(err.cause().to_string().contains("timed out"));
    assert!(engine.was_terminated());
}

#[test]
fn test_configuration_errors_surface_before_dispatch() {
    let engine = ScriptedEngine::from_frames(converging_frames());
    let mut orchestrator = Orchestrator::new(engine.clone(), fast_settings());

    let bad = RunConfig {
        min_random: 1.0,
        max_random: 1.0,
        ..config()
    };
    assert!(matches!(orchestrator.configure(bad), Err(TinyGpError::Configuration(_))));
    assert!(orchestrator.use_dataset(dataset()).is_err());

    // Twenty variables plus the default pool overflow the code space.
    orchestrator.configure(config()).unwrap();
    let wide = Dataset::new(20, vec![vec![0.0; 21]]).unwrap();
    assert!(matches!(orchestrator.use_dataset(wide), Err(TinyGpError::Configuration(_))));

    assert!(orchestrator.run(&CancelToken::new(), &mut tinygp::services::NoopObserver).is_err());
    assert_eq!(engine.dispatch_count(), 0);
}

#[test]
fn test_background_runner_reports_progress() -> anyhow::Result<()> {
    init_logging();
    let engine = ScriptedEngine::from_frames(converging_frames());
    let mut runner = EvolutionRunner::start(engine, fast_settings(), config(), dataset())?;

    let outcome = loop {
        if let Some(result) = runner.try_get_results() {
            break result?;
        }
        std::thread::sleep(Duration::from_millis(5));
    };
    assert_eq!(outcome.history.len(), 3);

    let mut updates = Vec::new();
    while let Some(update) = runner.poll_progress() {
        updates.push(update);
    }
    let generations: Vec<u32> = updates.iter().filter_map(|u| u.generation).collect();
    assert_eq!(generations, vec![0, 1, 2]);
    assert_eq!(
        updates.last().and_then(|u| u.state.clone()),
        Some(RunState::Completed)
    );
    assert!(runner.try_get_results().is_none());
    Ok(())
}

#[test]
fn test_background_runner_cancel() {
    // The script stops after one generation; the run only ends on cancel.
    let engine = ScriptedEngine::from_frames(vec![started(), generation(0, 1.0, vec![0])]);
    let runner = EvolutionRunner::start(engine.clone(), fast_settings(), config(), dataset()).unwrap();

    std::thread::sleep(Duration::from_millis(30));
    assert!(!runner.is_finished());
    runner.cancel();

    assert!(matches!(runner.wait(), Err(TinyGpError::Cancelled)));
    assert!(engine.was_terminated());
}

#[test]
fn test_program_over_max_length_aborts() {
    let engine = ScriptedEngine::from_frames(vec![
        started(),
        generation(0, 2.0, vec![0]),
        generation(1, 1.0, vec![110, 110, 0, 5, 110, 0, 5]),
        finished(false),
    ]);
    let config = RunConfig {
        max_length: 5,
        ..config()
    };
    let err = Orchestrator::new(engine, fast_settings())
        .execute(config, dataset())
        .unwrap_err();

    assert!(matches!(err, TinyGpError::RunAborted { last_generation: Some(0), .. }));
    assert!(matches!(err.cause(), TinyGpError::Decode(m) if m.contains("maximum length 5")));
}

#[test]
fn test_deep_program_at_max_length() -> anyhow::Result<()> {
    // SIN applied 9999 times to X1 fills the default maximum length exactly.
    let mut deep = vec![115; 9_999];
    deep.push(0);
    let engine = ScriptedEngine::from_frames(vec![started(), generation(0, 1.0, deep), finished(false)]);
    let outcome = Orchestrator::new(engine, fast_settings()).execute(config(), dataset())?;

    let best = outcome.best_individual().expect("one generation collected");
    assert_eq!(best.size(), 10_000);
    assert!(best.evaluate(&[1.0])?.is_finite());
    let fitness = tinygp::engines::evaluation::score(
        best.program(),
        &outcome.dataset,
        tinygp::FitnessFunction::MeanAbsoluteError,
    )?;
    assert!(fitness.is_finite());
    assert!(best.render().starts_with("SIN(SIN("));
    Ok(())
}
