use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};
use crate::constants::EVENT_HISTORY_RUNS;

/// Almacenamiento de eventos append-only.
pub trait EventStore: Send {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Lista eventos de una ejecución (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
}

/// Store en memoria que guarda sólo las últimas `max_runs` ejecuciones.
#[derive(Debug)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<RunEvent>>,
    order: VecDeque<Uuid>,
    max_runs: usize,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::with_run_limit(EVENT_HISTORY_RUNS)
    }
}

impl InMemoryEventStore {
    pub fn with_run_limit(max_runs: usize) -> Self {
        Self { inner: HashMap::new(),
               order: VecDeque::new(),
               max_runs: max_runs.max(1) }
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        if !self.inner.contains_key(&run_id) {
            self.order.push_back(run_id);
            while self.order.len() > self.max_runs {
                if let Some(oldest) = self.order.pop_front() {
                    self.inner.remove(&oldest);
                }
            }
        }
        let events = self.inner.entry(run_id).or_default();
        let ev = RunEvent { seq: events.len() as u64,
                            run_id,
                            kind,
                            ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_per_run() {
        let mut store = InMemoryEventStore::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.append_kind(a, RunEventKind::RunStarted { step_count: 2 });
        let ev = store.append_kind(a, RunEventKind::RunCompleted);
        store.append_kind(b, RunEventKind::RunStarted { step_count: 1 });
        assert_eq!(ev.seq, 1);
        assert_eq!(store.list(a).len(), 2);
        assert_eq!(store.list(b).len(), 1);
        assert!(store.list(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn oldest_runs_are_dropped_past_the_limit() {
        let mut store = InMemoryEventStore::with_run_limit(2);
        let runs = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        for run in runs {
            store.append_kind(run, RunEventKind::RunStarted { step_count: 1 });
            store.append_kind(run, RunEventKind::RunCompleted);
        }
        assert!(store.list(runs[0]).is_empty());
        assert_eq!(store.list(runs[1]).len(), 2);
        assert_eq!(store.list(runs[2]).len(), 2);
    }
}
