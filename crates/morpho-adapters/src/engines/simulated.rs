//! Motor simulado: no ejecuta nada, crea las salidas declaradas.
//!
//! Sirve para probar la orquestación (y para `--simulate` en la CLI) sin
//! tener instalados los programas de imagen.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use morpho_core::runner::EngineError;
use morpho_core::{CommandDescription, ExecOutcome, ExecutionEngine, ProcessHandle};
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default, Clone)]
pub struct SimulatedEngine {
    failing: HashSet<String>,
    unlaunchable: HashSet<String>,
    delay: Duration,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// El step `id` termina con estado 1 sin crear sus salidas.
    pub fn failing_step(mut self, id: impl Into<String>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// El step `id` ni siquiera puede lanzarse.
    pub fn unlaunchable_step(mut self, id: impl Into<String>) -> Self {
        self.unlaunchable.insert(id.into());
        self
    }

    /// Tiempo que tarda cada step.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl ExecutionEngine for SimulatedEngine {
    fn launch(&self, command: &CommandDescription) -> Result<Arc<dyn ProcessHandle>, EngineError> {
        if self.unlaunchable.contains(&command.step_id) {
            return Err(EngineError::Launch { program: command.program.clone(),
                                             reason: "simulated launch failure".into() });
        }
        Ok(Arc::new(SimulatedProcess { command: command.clone(),
                                       fail: self.failing.contains(&command.step_id),
                                       deadline: Instant::now() + self.delay,
                                       terminated: Mutex::new(false),
                                       signal: Condvar::new() }))
    }
}

struct SimulatedProcess {
    command: CommandDescription,
    fail: bool,
    deadline: Instant,
    terminated: Mutex<bool>,
    signal: Condvar,
}

impl SimulatedProcess {
    fn write_outputs(&self) -> std::io::Result<()> {
        for path in &self.command.outputs {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, format!("simulated by {}\n", self.command.program))?;
        }
        Ok(())
    }
}

impl ProcessHandle for SimulatedProcess {
    fn wait(&self) -> ExecOutcome {
        let mut terminated = self.terminated.lock();
        while !*terminated {
            if self.signal.wait_until(&mut terminated, self.deadline).timed_out() {
                break;
            }
        }
        if *terminated {
            return ExecOutcome::failure(None, "terminated");
        }
        drop(terminated);

        if self.fail {
            return ExecOutcome::failure(Some(1), format!("{}: simulated failure", self.command.program));
        }
        match self.write_outputs() {
            Ok(()) => {
                debug!("simulated '{}' wrote {} files", self.command.step_id, self.command.outputs.len());
                ExecOutcome::success()
            }
            Err(e) => ExecOutcome::failure(Some(1), e.to_string()),
        }
    }

    fn terminate(&self) {
        *self.terminated.lock() = true;
        self.signal.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn command(step: &str, out: PathBuf) -> CommandDescription {
        CommandDescription { step_id: step.into(),
                             program: "prog".into(),
                             args: Vec::new(),
                             outputs: vec![out] }
    }

    #[test]
    fn success_creates_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/y.ima");
        let p = SimulatedEngine::new().launch(&command("b", out.clone())).unwrap();
        assert!(p.wait().is_success());
        assert!(out.exists());
    }

    #[test]
    fn failing_step_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("y.ima");
        let p = SimulatedEngine::new().failing_step("b").launch(&command("b", out.clone())).unwrap();
        assert_eq!(p.wait().exit_code, Some(1));
        assert!(!out.exists());
    }

    #[test]
    fn terminate_interrupts_the_delay() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SimulatedEngine::new().with_delay(Duration::from_secs(30));
        let p = engine.launch(&command("a", dir.path().join("x"))).unwrap();
        p.terminate();
        let started = Instant::now();
        assert_eq!(p.wait().exit_code, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
