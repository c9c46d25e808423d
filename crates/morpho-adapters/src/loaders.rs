//! Cargador de archivos de histograma `.han`.
//!
//! Formato (una línea por tejido, el resto se ignora):
//!
//! ```text
//! gray: 512 38
//! white: 640 22
//! ```
//!
//! También acepta la variante etiquetada `gray: mean: 512 sigma: 38`.

use std::fs;
use std::path::Path;

use morpho_core::{LoadError, ResultLoader};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TissueStats {
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoAnalysis {
    pub gray: TissueStats,
    pub white: TissueStats,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HistoAnalysisLoader;

impl HistoAnalysisLoader {
    pub fn parse(path: &Path, text: &str) -> Result<HistoAnalysis, LoadError> {
        let mut gray = None;
        let mut white = None;
        for (idx, line) in text.lines().enumerate() {
            let Some((key, rest)) = line.split_once(':') else { continue };
            let slot = match key.trim() {
                "gray" => &mut gray,
                "white" => &mut white,
                _ => continue,
            };
            *slot = Some(parse_stats(rest).map_err(|reason| LoadError::Parse { path: path.to_path_buf(),
                                                                              line: idx + 1,
                                                                              reason })?);
        }
        let missing = |tissue: &str| LoadError::Parse { path: path.to_path_buf(),
                                                        line: 0,
                                                        reason: format!("no '{tissue}' line") };
        Ok(HistoAnalysis { gray: gray.ok_or_else(|| missing("gray"))?,
                           white: white.ok_or_else(|| missing("white"))? })
    }
}

fn parse_stats(rest: &str) -> Result<TissueStats, String> {
    let numbers = rest.split_whitespace()
                      .filter(|t| !t.ends_with(':'))
                      .map(|t| t.parse::<f64>().map_err(|_| format!("'{t}' is not a number")))
                      .collect::<Result<Vec<_>, _>>()?;
    match numbers.as_slice() {
        [mean, std, ..] => Ok(TissueStats { mean: *mean, std: *std }),
        _ => Err("expected a mean and a standard deviation".into()),
    }
}

impl ResultLoader for HistoAnalysisLoader {
    type Object = HistoAnalysis;

    fn load(&self, path: &Path) -> Result<HistoAnalysis, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        Self::parse(path, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_layouts_parse() {
        let p = Path::new("s1.han");
        let plain = HistoAnalysisLoader::parse(p, "gray: 512 38\nwhite: 640 22\n").unwrap();
        let tagged = HistoAnalysisLoader::parse(p, "gray: mean: 512 sigma: 38\nwhite: mean: 640 sigma: 22").unwrap();
        assert_eq!(plain, tagged);
        assert_eq!(plain.white, TissueStats { mean: 640.0, std: 22.0 });
    }

    #[test]
    fn missing_tissue_is_an_error() {
        let err = HistoAnalysisLoader::parse(Path::new("x.han"), "gray: 1 2\n").unwrap_err();
        assert!(err.to_string().contains("white"));
    }

    #[test]
    fn garbage_reports_the_line() {
        let err = HistoAnalysisLoader::parse(Path::new("x.han"), "# histo\ngray: a b\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 2, .. }));
    }
}
