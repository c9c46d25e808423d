//! Procesos locales del sistema operativo.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use morpho_core::constants::PROCESS_POLL_INTERVAL_MS;
use morpho_core::runner::EngineError;
use morpho_core::{CommandDescription, ExecOutcome, ExecutionEngine, ProcessHandle};
use parking_lot::Mutex;

/// Lanza cada comando con `std::process::Command`. El stderr del proceso es
/// el diagnóstico de un fallo.
#[derive(Debug, Default, Clone)]
pub struct LocalProcessEngine {
    poll_interval: Option<Duration>,
}

impl LocalProcessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}

impl LocalProcessEngine {
    fn spawn(&self, command: &CommandDescription) -> Result<LocalProcess, EngineError> {
        let mut child = Command::new(&command.program).args(&command.args)
                                                      .stdin(Stdio::null())
                                                      .stdout(Stdio::null())
                                                      .stderr(Stdio::piped())
                                                      .spawn()
                                                      .map_err(|e| EngineError::Launch { program: command.program.clone(),
                                                                                         reason: e.to_string() })?;
        debug!("spawned '{}' (pid {})", command.program, child.id());
        let stderr = child.stderr.take().map(|mut pipe| {
                                            thread::spawn(move || {
                                                let mut buf = String::new();
                                                let _ = pipe.read_to_string(&mut buf);
                                                buf
                                            })
                                        });
        let interval = self.poll_interval
                           .unwrap_or(Duration::from_millis(PROCESS_POLL_INTERVAL_MS));
        Ok(LocalProcess { child: Mutex::new(child),
                          stderr: Mutex::new(stderr),
                          outcome: Mutex::new(None),
                          interval })
    }
}

impl ExecutionEngine for LocalProcessEngine {
    fn launch(&self, command: &CommandDescription) -> Result<Arc<dyn ProcessHandle>, EngineError> {
        Ok(Arc::new(self.spawn(command)?))
    }
}

struct LocalProcess {
    child: Mutex<Child>,
    stderr: Mutex<Option<JoinHandle<String>>>,
    outcome: Mutex<Option<ExecOutcome>>,
    interval: Duration,
}

impl LocalProcess {
    fn poll(&self) -> std::io::Result<ExitStatus> {
        loop {
            // El lock se suelta entre sondeos para que `terminate` pueda entrar.
            if let Some(status) = self.child.lock().try_wait()? {
                return Ok(status);
            }
            thread::sleep(self.interval);
        }
    }

    fn remember(&self, outcome: ExecOutcome) -> ExecOutcome {
        *self.outcome.lock() = Some(outcome.clone());
        outcome
    }

    fn collect_stderr(&self) -> String {
        match self.stderr.lock().take() {
            Some(reader) => reader.join().unwrap_or_default(),
            None => String::new(),
        }
    }
}

impl ProcessHandle for LocalProcess {
    fn wait(&self) -> ExecOutcome {
        if let Some(done) = self.outcome.lock().clone() {
            return done;
        }
        let outcome = match self.poll() {
            Ok(status) => {
                // El lector termina al cerrarse el pipe: se une también en éxito.
                let stderr = self.collect_stderr();
                if status.success() {
                    return self.remember(ExecOutcome::success());
                }
                let diagnostic = match stderr.trim() {
                    "" => format!("process exited with {status}"),
                    text => text.to_string(),
                };
                ExecOutcome::failure(status.code(), diagnostic)
            }
            Err(e) => ExecOutcome::failure(None, format!("cannot wait for process: {e}")),
        };
        self.remember(outcome)
    }

    fn terminate(&self) {
        let mut child = self.child.lock();
        if let Err(e) = child.kill() {
            // Ya terminó: nada que matar.
            warn!("cannot kill pid {}: {e}", child.id());
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn command(program: &str, args: &[&str]) -> CommandDescription {
        CommandDescription { step_id: "t".into(),
                             program: program.into(),
                             args: args.iter().map(|a| a.to_string()).collect(),
                             outputs: Vec::new() }
    }

    #[test]
    fn exit_status_and_stderr_are_reported() {
        let engine = LocalProcessEngine::new();
        let ok = engine.launch(&command("sh", &["-c", "exit 0"])).unwrap();
        assert!(ok.wait().is_success());

        let bad = engine.launch(&command("sh", &["-c", "echo broken >&2; exit 3"])).unwrap();
        let outcome = bad.wait();
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.diagnostic, "broken");
    }

    #[test]
    fn stderr_reader_is_joined_on_success() {
        let process = LocalProcessEngine::new().spawn(&command("sh", &["-c", "echo noise >&2; exit 0"]))
                                               .unwrap();
        assert!(process.wait().is_success());
        assert!(process.stderr.lock().is_none());
    }

    #[test]
    fn unknown_program_fails_to_launch() {
        let err = LocalProcessEngine::new().launch(&command("morpho-no-such-program", &[]))
                                           .err()
                                           .unwrap();
        assert!(matches!(err, EngineError::Launch { .. }));
    }

    #[test]
    fn terminate_ends_a_long_process() {
        let engine = LocalProcessEngine::new().with_poll_interval(Duration::from_millis(5));
        let p = engine.launch(&command("sleep", &["30"])).unwrap();
        p.terminate();
        let outcome = p.wait();
        assert!(!outcome.is_success());
        assert_eq!(outcome.exit_code, None);
    }
}
