use std::path::{Path, PathBuf};

use morpho_core::naming::OutputFile;
use morpho_core::{NamingError, NamingPolicy, Subject};

use super::{discover, find_image, raw_file_name};

/// Jerarquía BrainVISA:
///
/// ```text
/// <root>/<grupo>/<sujeto>/t1mri/default_acquisition/<sujeto>.<ext>
///                                                  /default_analysis/...
///                                                  /default_analysis/segmentation/...
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct BrainvisaNaming;

pub const BRAINVISA: &str = "brainvisa";

impl BrainvisaNaming {
    fn acquisition_dir(&self, root: &Path, subject: &Subject) -> PathBuf {
        self.subject_dir(root, subject).join("t1mri").join("default_acquisition")
    }
}

impl NamingPolicy for BrainvisaNaming {
    fn name(&self) -> &str {
        BRAINVISA
    }

    fn subject_dir(&self, root: &Path, subject: &Subject) -> PathBuf {
        root.join(&subject.groupname).join(&subject.name)
    }

    fn raw_input_path(&self, root: &Path, subject: &Subject) -> PathBuf {
        self.acquisition_dir(root, subject).join(raw_file_name(subject))
    }

    fn output_path(&self, root: &Path, subject: &Subject, file: &OutputFile) -> PathBuf {
        let mut dir = self.acquisition_dir(root, subject).join("default_analysis");
        if let Some(group) = file.group {
            dir.push(group);
        }
        dir.join(file.file_name(subject))
    }

    fn discover_subjects(&self, root: &Path) -> Result<Vec<Subject>, NamingError> {
        discover(root, |dir, name| find_image(&dir.join("t1mri").join("default_acquisition"), name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRAIN: OutputFile = OutputFile { name: "brain_mask",
                                           prefix: "brain",
                                           extension: "ima",
                                           group: Some("segmentation") };

    #[test]
    fn layout() {
        let s = Subject::new("s1", "ctrl", "/in/s1.nii.gz");
        let root = Path::new("/out");
        assert_eq!(BrainvisaNaming.raw_input_path(root, &s),
                   PathBuf::from("/out/ctrl/s1/t1mri/default_acquisition/s1.nii.gz"));
        assert_eq!(BrainvisaNaming.output_path(root, &s, &BRAIN),
                   PathBuf::from("/out/ctrl/s1/t1mri/default_acquisition/default_analysis/segmentation/brain_s1.ima"));
    }

    #[test]
    fn discovers_organized_subjects() {
        let dir = tempfile::tempdir().unwrap();
        let acq = dir.path().join("g1/s2/t1mri/default_acquisition");
        std::fs::create_dir_all(&acq).unwrap();
        std::fs::write(acq.join("s2.nii"), b"img").unwrap();
        std::fs::write(acq.join("s2.APC"), b"apc").unwrap();
        std::fs::create_dir_all(dir.path().join("g1/empty")).unwrap();

        let found = BrainvisaNaming.discover_subjects(dir.path()).unwrap();
        assert_eq!(found, vec![Subject::new("s2", "g1", acq.join("s2.nii"))]);
    }
}
