//! Configuración del store desde variables de entorno.

use std::env;

use dotenvy::dotenv;
use log::warn;
use morpho_core::constants::DEFAULT_BACKUP_FILE_NAME;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_JSON_INDENT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Nombre del archivo del estudio dentro de su `outputdir`.
    pub file_name: String,
    /// Conserva la versión anterior como `<archivo>.bak` al guardar.
    pub keep_backup: bool,
    pub json_indent: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { file_name: DEFAULT_BACKUP_FILE_NAME.to_string(),
               keep_backup: true,
               json_indent: DEFAULT_JSON_INDENT }
    }
}

impl StoreConfig {
    /// `MORPHO_STUDY_FILE_NAME`, `MORPHO_KEEP_BACKUP`, `MORPHO_JSON_INDENT`.
    /// Un valor inválido se ignora con un aviso.
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let file_name = match lookup("MORPHO_STUDY_FILE_NAME") {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            Some(_) => {
                warn!("MORPHO_STUDY_FILE_NAME is empty, using '{}'", defaults.file_name);
                defaults.file_name
            }
            None => defaults.file_name,
        };
        let keep_backup = lookup("MORPHO_KEEP_BACKUP").map_or(defaults.keep_backup, |v| {
                                                           parse_bool(&v).unwrap_or_else(|| {
                                                                             warn!("invalid MORPHO_KEEP_BACKUP '{v}'");
                                                                             defaults.keep_backup
                                                                         })
                                                       });
        let json_indent = lookup("MORPHO_JSON_INDENT").map_or(defaults.json_indent, |v| {
                                                           v.trim().parse().unwrap_or_else(|_| {
                                                                               warn!("invalid MORPHO_JSON_INDENT '{v}'");
                                                                               defaults.json_indent
                                                                           })
                                                       });
        Self { file_name,
               keep_backup,
               json_indent }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
