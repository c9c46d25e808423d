//! StudyRunner: un `Runner` por sujeto.
//!
//! Los runners se crean bajo demanda y viven en un `DashMap`, así un poller
//! puede leer estados mientras el dueño del estudio despacha ejecuciones.

use std::sync::Arc;

use dashmap::DashMap;
use log::{info, warn};
use morpho_core::{derive_status, ExecutionEngine, ParameterSet, RunState, Runner, RunnerError, StepFailure,
                  Subject, SubjectStatus};
use uuid::Uuid;

use crate::error::StudyError;
use crate::selection::Selection;
use crate::study::Study;

/// Resultado del despacho de una selección. Un sujeto rechazado no impide
/// que arranquen los demás.
#[derive(Debug, Default)]
pub struct RunReport {
    pub started: Vec<(String, Uuid)>,
    pub rejected: Vec<(String, RunnerError)>,
}

impl RunReport {
    pub fn all_started(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug)]
pub struct StudyRunner {
    engine: Arc<dyn ExecutionEngine>,
    runners: DashMap<String, Arc<Runner>>,
}

impl StudyRunner {
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self { engine,
               runners: DashMap::new() }
    }

    fn runner(&self, id: &str) -> Arc<Runner> {
        self.runners
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Runner::new(Arc::clone(&self.engine))))
            .clone()
    }

    fn existing(&self, id: &str) -> Option<Arc<Runner>> {
        self.runners.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Lanza los sujetos seleccionados. Un estado terminal previo se da por
    /// reconocido; los rechazos del runner quedan en `rejected`.
    pub fn run(&self, study: &Study, selection: &Selection) -> Result<RunReport, StudyError> {
        let ids = study.select(selection)?;
        let mut report = RunReport::default();
        for id in ids {
            let analysis = study.analysis(&id)
                                .ok_or_else(|| StudyError::UnknownSubject(id.clone()))?;
            let runner = self.runner(&id);
            if runner.state().is_terminal() {
                // Sólo falla si está corriendo, y no lo está.
                let _ = runner.reset();
            }
            match runner.run(analysis) {
                Ok(run_id) => report.started.push((id, run_id)),
                Err(e) => {
                    warn!("subject {id} not started: {e}");
                    report.rejected.push((id, e));
                }
            }
        }
        info!("dispatched {} subjects ({} rejected)", report.started.len(), report.rejected.len());
        Ok(report)
    }

    /// `true` si el sujeto estaba corriendo.
    pub fn stop(&self, id: &str) -> bool {
        self.existing(id).is_some_and(|r| r.stop())
    }

    /// Cantidad de sujetos a los que se pidió parar.
    pub fn stop_all(&self) -> usize {
        self.handles().iter().filter(|(_, r)| r.stop()).count()
    }

    /// Espera a todos los runners; devuelve el estado final de cada uno.
    pub fn wait_all(&self) -> Vec<(String, RunState)> {
        let mut out = Vec::new();
        for (id, runner) in self.handles() {
            match runner.wait() {
                Ok(state) => out.push((id, state)),
                Err(e) => warn!("cannot wait for {id}: {e}"),
            }
        }
        out
    }

    // Copia de los handles: nunca se bloquea con un shard del mapa tomado.
    fn handles(&self) -> Vec<(String, Arc<Runner>)> {
        let mut all: Vec<_> = self.runners
                                  .iter()
                                  .map(|e| (e.key().clone(), Arc::clone(e.value())))
                                  .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn state(&self, id: &str) -> RunState {
        self.existing(id).map_or(RunState::Idle, |r| r.state())
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.state(id) == RunState::Running
    }

    pub fn any_running(&self) -> bool {
        self.runners.iter().any(|e| e.value().is_running())
    }

    pub fn last_failure(&self, id: &str) -> Option<StepFailure> {
        self.existing(id).and_then(|r| r.last_failure())
    }

    pub fn status(&self, study: &Study, id: &str) -> Result<SubjectStatus, StudyError> {
        let analysis = study.analysis(id)
                            .ok_or_else(|| StudyError::UnknownSubject(id.to_string()))?;
        let outputs = analysis.outputs();
        Ok(derive_status(self.state(id),
                         outputs.list_existing_files().len(),
                         outputs.list_missing_files().len()))
    }

    /// Cambia las entradas de un sujeto salvo que esté corriendo.
    pub fn update_parameters(&self, study: &mut Study, id: &str, inputs: ParameterSet) -> Result<(), StudyError> {
        if self.is_running(id) {
            return Err(StudyError::SubjectRunning(id.to_string()));
        }
        study.set_subject_parameters(id, inputs)
    }

    /// Quita un sujeto del estudio salvo que esté corriendo.
    pub fn remove_subject(&self,
                          study: &mut Study,
                          id: &str,
                          delete_files: bool)
                          -> Result<Subject, StudyError> {
        if self.is_running(id) {
            return Err(StudyError::SubjectRunning(id.to_string()));
        }
        let subject = if delete_files {
            study.remove_subject_and_files(id)?
        } else {
            study.remove_subject(id)?
        };
        self.runners.remove(id);
        Ok(subject)
    }
}
