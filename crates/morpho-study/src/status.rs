//! StatusBoard: recálculo de estados por tick y diff contra el tick anterior.
//!
//! Es pull: el llamador decide cuándo hacer `tick` (un timer, la CLI con
//! `--watch`). Los observadores suscritos reciben sólo los cambios.

use indexmap::IndexMap;
use log::debug;
use morpho_core::SubjectStatus;

use crate::error::StudyError;
use crate::runner::StudyRunner;
use crate::study::Study;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub subject_id: String,
    /// `None` la primera vez que se ve al sujeto.
    pub previous: Option<SubjectStatus>,
    pub current: SubjectStatus,
}

pub trait StatusObserver: Send {
    fn status_changed(&mut self, change: &StatusChange);
}

impl<F> StatusObserver for F where F: FnMut(&StatusChange) + Send
{
    fn status_changed(&mut self, change: &StatusChange) {
        (*self)(change)
    }
}

#[derive(Default)]
pub struct StatusBoard {
    last: IndexMap<String, SubjectStatus>,
    observers: Vec<Box<dyn StatusObserver>>,
}

impl std::fmt::Debug for StatusBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBoard")
         .field("last", &self.last)
         .field("observers", &self.observers.len())
         .finish()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn StatusObserver>) {
        self.observers.push(observer);
    }

    /// Recalcula el estado de cada sujeto y devuelve los que cambiaron. Los
    /// sujetos que ya no están en el estudio se olvidan.
    pub fn tick(&mut self, study: &Study, runner: &StudyRunner) -> Result<Vec<StatusChange>, StudyError> {
        let mut changes = Vec::new();
        let mut next = IndexMap::with_capacity(study.len());
        for id in study.subject_ids() {
            let current = runner.status(study, id)?;
            let previous = self.last.get(id).copied();
            if previous != Some(current) {
                changes.push(StatusChange { subject_id: id.to_string(),
                                            previous,
                                            current });
            }
            next.insert(id.to_string(), current);
        }
        self.last = next;
        if !changes.is_empty() {
            debug!("{} status changes", changes.len());
        }
        for change in &changes {
            for observer in &mut self.observers {
                observer.status_changed(change);
            }
        }
        Ok(changes)
    }

    pub fn current(&self, id: &str) -> Option<SubjectStatus> {
        self.last.get(id).copied()
    }

    pub fn statuses(&self) -> impl Iterator<Item = (&str, SubjectStatus)> {
        self.last.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
