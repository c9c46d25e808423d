//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! Un valor inválido no aborta: se avisa y se usa el valor por defecto.
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;
use once_cell::sync::Lazy;

pub const DEFAULT_ANALYSIS_TYPE: &str = "IntraAnalysis";
pub const DEFAULT_PARAMETER_TEMPLATE: &str = "brainvisa";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Motor con el que se lanzan los steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Procesos reales del sistema.
    #[default]
    Local,
    /// Sin procesos: sólo se crean las salidas declaradas.
    Simulated,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(EngineKind::Local),
            "simulated" | "simulate" => Ok(EngineKind::Simulated),
            other => Err(format!("unknown engine '{other}'")),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Local => "local",
            EngineKind::Simulated => "simulated",
        })
    }
}

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Carpeta bajo la que se crean los estudios nuevos.
    pub studies_dir: PathBuf,
    pub analysis_type: String,
    /// Política de nombres de los estudios nuevos.
    pub parameter_template: String,
    /// Tick de `status --watch` y del seguimiento de `run`.
    pub poll_interval: Duration,
    pub engine: EngineKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { studies_dir: default_studies_dir(),
               analysis_type: DEFAULT_ANALYSIS_TYPE.to_string(),
               parameter_template: DEFAULT_PARAMETER_TEMPLATE.to_string(),
               poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
               engine: EngineKind::default() }
    }
}

fn default_studies_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
                    .join("morphologist")
                    .join("studies")
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignora error si no existe .env
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| match lookup(key) {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            Some(_) => {
                warn!("{key} is empty, using '{default}'");
                default
            }
            None => default,
        };
        let studies_dir = PathBuf::from(text("MORPHO_STUDIES_DIR", defaults.studies_dir.display().to_string()));
        let analysis_type = text("MORPHO_ANALYSIS_TYPE", defaults.analysis_type);
        let parameter_template = text("MORPHO_PARAMETER_TEMPLATE", defaults.parameter_template);
        let poll_interval = match lookup("MORPHO_POLL_INTERVAL_MS").map(|v| v.trim().parse::<u64>()) {
            Some(Ok(ms)) if ms > 0 => Duration::from_millis(ms),
            Some(_) => {
                warn!("invalid MORPHO_POLL_INTERVAL_MS, using {DEFAULT_POLL_INTERVAL_MS}");
                defaults.poll_interval
            }
            None => defaults.poll_interval,
        };
        let engine = match lookup("MORPHO_ENGINE").map(|v| v.parse::<EngineKind>()) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                warn!("{e}, using '{}'", defaults.engine);
                defaults.engine
            }
            None => defaults.engine,
        };
        Self { studies_dir,
               analysis_type,
               parameter_template,
               poll_interval,
               engine }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
