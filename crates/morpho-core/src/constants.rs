//! Constantes del core.

/// Nombre del archivo de respaldo de un estudio dentro de su `outputdir`.
pub const DEFAULT_BACKUP_FILE_NAME: &str = "study.json";

/// Grupo asignado a un sujeto cuando el usuario no indica ninguno.
pub const DEFAULT_GROUP: &str = "default";

/// Intervalo con el que los engines locales sondean un proceso en curso.
/// Acota la latencia de `stop()` sin ocupar la CPU.
pub const PROCESS_POLL_INTERVAL_MS: u64 = 50;

/// Ejecuciones cuyo log de eventos conserva el store en memoria de un runner.
pub const EVENT_HISTORY_RUNS: usize = 16;
