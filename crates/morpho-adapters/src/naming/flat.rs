use std::path::{Path, PathBuf};

use morpho_core::naming::OutputFile;
use morpho_core::{NamingError, NamingPolicy, Subject};

use super::{discover, find_image, raw_file_name};

/// Todo en la carpeta del sujeto: `<root>/<grupo>/<sujeto>/<prefijo>_<sujeto>.<ext>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatNaming;

pub const FLAT: &str = "flat";

impl NamingPolicy for FlatNaming {
    fn name(&self) -> &str {
        FLAT
    }

    fn subject_dir(&self, root: &Path, subject: &Subject) -> PathBuf {
        root.join(&subject.groupname).join(&subject.name)
    }

    fn raw_input_path(&self, root: &Path, subject: &Subject) -> PathBuf {
        self.subject_dir(root, subject).join(raw_file_name(subject))
    }

    fn output_path(&self, root: &Path, subject: &Subject, file: &OutputFile) -> PathBuf {
        self.subject_dir(root, subject).join(file.file_name(subject))
    }

    fn discover_subjects(&self, root: &Path) -> Result<Vec<Subject>, NamingError> {
        discover(root, find_image)
    }
}
