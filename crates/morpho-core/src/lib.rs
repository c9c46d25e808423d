//! morpho-core: orquestación de análisis multi-step por sujeto.
//!
//! El core no conoce los algoritmos de imagen: un step es un comando externo
//! opaco que consume archivos de entrada y produce archivos de salida. Lo que
//! sí garantiza:
//! - cableado exactamente-una-vez de parámetros entre steps (`flow`),
//! - semántica run/stop/wait consistente bajo ejecución asíncrona (`runner`),
//! - derivación pura de estados para cualquier poller (`status`).
pub mod analysis;
pub mod constants;
pub mod errors;
pub mod event;
pub mod flow;
pub mod loader;
pub mod naming;
pub mod params;
pub mod runner;
pub mod status;
pub mod step;
pub mod subject;

pub use analysis::{Analysis, AnalysisBlueprint, AnalysisRegistry, ImportItem};
pub use errors::{AnalysisError, FlowError, ParameterError, RegistryError, RunnerError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use flow::{Binding, BindingSource, StepFlow};
pub use loader::{LoadError, ResultLoader};
pub use naming::{NamingError, NamingPolicy, OutputFile};
pub use params::{ParamValue, ParameterSet, ParameterSide};
pub use runner::{ExecOutcome, ExecutionEngine, ProcessHandle, RunSnapshot, RunState, Runner, StepFailure};
pub use status::{derive_status, SubjectStatus};
pub use step::{Arg, BoundValues, CommandDescription, CommandStep, Step, StepDefinition};
pub use subject::Subject;
