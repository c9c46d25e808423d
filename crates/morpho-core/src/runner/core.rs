//! Implementación del Runner.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use super::{ExecutionEngine, ProcessHandle, RunSnapshot, RunState, StepFailure};
use crate::analysis::Analysis;
use crate::errors::{AnalysisError, RunnerError};
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::step::CommandDescription;

/// Estado compartido entre el runner, su worker y los pollers.
///
/// Orden de locks: `current` -> `snapshot` -> `events`. Nunca al revés.
struct Shared {
    snapshot: Mutex<RunSnapshot>,
    changed: Condvar,
    cancel: AtomicBool,
    current: Mutex<Option<Arc<dyn ProcessHandle>>>,
    waiting: AtomicBool,
    starting: AtomicBool,
    events: Mutex<Box<dyn EventStore>>,
}

impl Shared {
    fn record(&self, run_id: Uuid, kind: RunEventKind) {
        self.events.lock().append_kind(run_id, kind);
    }

    fn finish(&self, run_id: Uuid, state: RunState, failure: Option<StepFailure>, kind: RunEventKind) {
        let mut snap = self.snapshot.lock();
        snap.state = state;
        snap.current_step = None;
        snap.failure = failure;
        self.record(run_id, kind);
        drop(snap);
        self.changed.notify_all();
    }
}

/// Driver de ejecución de un Analysis. Un runner por análisis.
pub struct Runner {
    engine: Arc<dyn ExecutionEngine>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
         .field("engine", &self.engine)
         .field("snapshot", &*self.shared.snapshot.lock())
         .finish()
    }
}

impl Runner {
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self::with_event_store(engine, Box::new(InMemoryEventStore::default()))
    }

    pub fn with_event_store(engine: Arc<dyn ExecutionEngine>, events: Box<dyn EventStore>) -> Self {
        let shared = Shared { snapshot: Mutex::new(RunSnapshot::default()),
                              changed: Condvar::new(),
                              cancel: AtomicBool::new(false),
                              current: Mutex::new(None),
                              waiting: AtomicBool::new(false),
                              starting: AtomicBool::new(false),
                              events: Mutex::new(events) };
        Self { engine,
               shared: Arc::new(shared),
               worker: Mutex::new(None) }
    }

    /// Lanza la ejecución en un worker dedicado y vuelve de inmediato.
    ///
    /// Antes de despachar, en estado `Idle`, rechaza: valores de parámetros
    /// vacíos, archivos de entrada ausentes y salidas ya existentes. El runner
    /// nunca sobreescribe resultados.
    ///
    /// Las comprobaciones en disco se hacen sin el lock del snapshot; mientras
    /// duran, otro `run()` recibe `StartInProgress`.
    pub fn run(&self, analysis: &Analysis) -> Result<Uuid, RunnerError> {
        let _claim = StartClaim::acquire(&self.shared.starting).ok_or(RunnerError::StartInProgress)?;
        let state = self.state();
        if state != RunState::Idle {
            return Err(RunnerError::AlreadyRunning { state });
        }
        let commands = analysis.commands()?;
        let missing = analysis.missing_input_files();
        if !missing.is_empty() {
            return Err(RunnerError::MissingInputFile { paths: missing });
        }
        let existing = analysis.outputs().list_existing_files();
        if !existing.is_empty() {
            return Err(RunnerError::OutputFileExist { paths: existing });
        }
        analysis.prepare_output_dirs().map_err(|e| match e {
                                          AnalysisError::Io { path, source } => RunnerError::OutputDir { path, source },
                                          other => RunnerError::Worker(other.to_string()),
                                      })?;

        // Sólo un `run()` con el claim saca al runner de `Idle`.
        let mut snap = self.shared.snapshot.lock();
        let run_id = Uuid::new_v4();
        *snap = RunSnapshot { run_id: Some(run_id),
                              state: RunState::Running,
                              current_step: None,
                              failure: None };
        self.shared.cancel.store(false, Ordering::SeqCst);
        self.shared.record(run_id, RunEventKind::RunStarted { step_count: commands.len() });

        let shared = Arc::clone(&self.shared);
        let engine = Arc::clone(&self.engine);
        let spawned = thread::Builder::new().name(format!("runner-{}", analysis.analysis_type()))
                                            .spawn(move || execute_guarded(&shared, engine.as_ref(), run_id, commands));
        let handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                *snap = RunSnapshot::default();
                return Err(RunnerError::Worker(e.to_string()));
            }
        };
        drop(snap);
        info!("run {run_id} dispatched ({})", analysis.analysis_type());

        let previous = self.worker.lock().replace(handle);
        if let Some(prev) = previous {
            // El worker anterior ya llegó a un estado terminal.
            let _ = prev.join();
        }
        Ok(run_id)
    }

    /// Pide la terminación del proceso en curso e impide que arranquen más
    /// steps. Devuelve `false` si no había nada ejecutándose.
    pub fn stop(&self) -> bool {
        if self.shared.snapshot.lock().state != RunState::Running {
            return false;
        }
        self.shared.cancel.store(true, Ordering::SeqCst);
        if let Some(process) = self.shared.current.lock().as_ref() {
            debug!("terminating in-flight process");
            process.terminate();
        }
        true
    }

    /// Bloquea hasta que el estado deje `Running`. Vuelve de inmediato si ya
    /// es terminal. Sólo admite un llamador a la vez.
    pub fn wait(&self) -> Result<RunState, RunnerError> {
        if self.shared.waiting.swap(true, Ordering::SeqCst) {
            return Err(RunnerError::WaitInProgress);
        }
        let mut snap = self.shared.snapshot.lock();
        while snap.state == RunState::Running {
            self.shared.changed.wait(&mut snap);
        }
        let state = snap.state;
        drop(snap);
        self.shared.waiting.store(false, Ordering::SeqCst);

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                error!("runner worker panicked");
            }
        }
        Ok(state)
    }

    /// Reconoce un estado terminal y vuelve a `Idle`.
    pub fn reset(&self) -> Result<(), RunnerError> {
        let mut snap = self.shared.snapshot.lock();
        if snap.state == RunState::Running {
            return Err(RunnerError::StillRunning);
        }
        *snap = RunSnapshot::default();
        Ok(())
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.shared.snapshot.lock().clone()
    }

    pub fn state(&self) -> RunState {
        self.shared.snapshot.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn last_run_failed(&self) -> bool {
        self.state() == RunState::Failed
    }

    pub fn last_failure(&self) -> Option<StepFailure> {
        self.shared.snapshot.lock().failure.clone()
    }

    /// Eventos de una ejecución (la última si `run_id` es `None`).
    pub fn events(&self, run_id: Option<Uuid>) -> Vec<RunEvent> {
        match run_id.or(self.shared.snapshot.lock().run_id) {
            Some(id) => self.shared.events.lock().list(id),
            None => Vec::new(),
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if self.stop() {
            warn!("runner dropped while running; stop requested");
        }
    }
}

/// Reserva exclusiva del arranque; se libera al salir de `run()`.
struct StartClaim<'a>(&'a AtomicBool);

impl<'a> StartClaim<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for StartClaim<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Un panic del engine termina la ejecución como `Failed`; si no, el estado
/// quedaría en `Running` para siempre.
fn execute_guarded(shared: &Shared, engine: &dyn ExecutionEngine, run_id: Uuid, commands: Vec<CommandDescription>) {
    let mut reached = 0;
    let result = panic::catch_unwind(AssertUnwindSafe(|| execute(shared, engine, run_id, commands, &mut reached)));
    let Err(payload) = result else { return };
    let reason = panic_reason(payload.as_ref());
    error!("run {run_id}: worker panicked in step {reached}: {reason}");
    shared.current.lock().take();
    let step_id = {
        let snap = shared.snapshot.lock();
        if snap.state != RunState::Running {
            return;
        }
        snap.current_step.clone().unwrap_or_default()
    };
    let failure = StepFailure { index: reached,
                                step_id,
                                exit_code: None,
                                diagnostic: format!("worker panicked: {reason}") };
    let kind = failed_event(&failure);
    shared.finish(run_id, RunState::Failed, Some(failure), kind);
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload.downcast_ref::<&str>()
           .map(|s| s.to_string())
           .or_else(|| payload.downcast_ref::<String>().cloned())
           .unwrap_or_else(|| "unknown panic".into())
}

fn execute(shared: &Shared,
           engine: &dyn ExecutionEngine,
           run_id: Uuid,
           commands: Vec<CommandDescription>,
           reached: &mut usize) {
    for (index, command) in commands.into_iter().enumerate() {
        *reached = index;
        let process = {
            let mut current = shared.current.lock();
            if shared.cancel.load(Ordering::SeqCst) {
                info!("run {run_id} stopped before step '{}'", command.step_id);
                shared.finish(run_id, RunState::Stopped, None, RunEventKind::RunStopped { step_index: index });
                return;
            }
            {
                let mut snap = shared.snapshot.lock();
                snap.current_step = Some(command.step_id.clone());
                shared.record(run_id,
                              RunEventKind::StepStarted { step_index: index,
                                                          step_id: command.step_id.clone() });
            }
            debug!("step '{}': {}", command.step_id, command);
            match engine.launch(&command) {
                Ok(p) => {
                    *current = Some(Arc::clone(&p));
                    p
                }
                Err(e) => {
                    drop(current);
                    warn!("run {run_id}: step '{}' could not start: {e}", command.step_id);
                    let failure = StepFailure { index,
                                                step_id: command.step_id.clone(),
                                                exit_code: None,
                                                diagnostic: e.to_string() };
                    let kind = failed_event(&failure);
                    shared.finish(run_id, RunState::Failed, Some(failure), kind);
                    return;
                }
            }
        };

        let outcome = process.wait();
        shared.current.lock().take();

        if shared.cancel.load(Ordering::SeqCst) {
            info!("run {run_id} stopped during step '{}'", command.step_id);
            shared.finish(run_id, RunState::Stopped, None, RunEventKind::RunStopped { step_index: index });
            return;
        }
        if !outcome.is_success() {
            warn!("run {run_id}: step '{}' exited with {:?}", command.step_id, outcome.exit_code);
            let failure = StepFailure { index,
                                        step_id: command.step_id.clone(),
                                        exit_code: outcome.exit_code,
                                        diagnostic: outcome.diagnostic };
            let kind = failed_event(&failure);
            shared.finish(run_id, RunState::Failed, Some(failure), kind);
            return;
        }
        shared.record(run_id,
                      RunEventKind::StepFinished { step_index: index,
                                                   step_id: command.step_id });
    }
    info!("run {run_id} succeeded");
    shared.finish(run_id, RunState::Succeeded, None, RunEventKind::RunCompleted);
}

fn failed_event(failure: &StepFailure) -> RunEventKind {
    RunEventKind::StepFailed { step_index: failure.index,
                               step_id: failure.step_id.clone(),
                               exit_code: failure.exit_code,
                               diagnostic: failure.diagnostic.clone() }
}
