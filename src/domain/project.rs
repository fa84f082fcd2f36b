use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::Exercise;

/// Local state of a project working copy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Known from the server but not on disk
    #[default]
    NotDownloaded,
    /// Root directory exists on disk
    Downloaded,
    /// Removed by the user; ignored by scans
    Deleted,
}

/// Build system of a project, detected outside this crate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    /// Ant (`build.xml`)
    JavaAnt,
    /// Maven (`pom.xml`)
    JavaMaven,
    /// `Makefile`
    Makefile,
    /// Anything else
    #[default]
    Unknown,
}

/// A local working copy bound to at most one exercise
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// The exercise this folder belongs to; `None` for plain workspace folders
    pub exercise: Option<Exercise>,

    /// Project root directory
    pub root_path: PathBuf,

    /// Tracked files and directories, absolute, as recorded by the last scan
    #[serde(default)]
    pub files: Vec<PathBuf>,

    /// Current status
    #[serde(default)]
    pub status: ProjectStatus,

    /// Build system, selects the zipping policy
    #[serde(default)]
    pub project_type: ProjectType,
}

impl Project {
    /// New not-yet-scanned project for `exercise` rooted at `root_path`
    pub fn new(exercise: Option<Exercise>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            exercise,
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Set the build system
    pub fn with_type(mut self, project_type: ProjectType) -> Self {
        self.project_type = project_type;
        self
    }

    /// Whether the root directory currently exists
    pub fn exists_on_disk(&self) -> bool {
        !self.root_path.as_os_str().is_empty() && self.root_path.is_dir()
    }

    /// Name of the bound exercise, or the folder name for unbound projects
    pub fn name(&self) -> String {
        match &self.exercise {
            Some(exercise) => exercise.name.clone(),
            None => self
                .root_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Whether `path` lies inside this project
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root_path)
    }
}

/// Archive of a project, produced by zipping and consumed once by upload
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZippedProject {
    bytes: Vec<u8>,
}

impl ZippedProject {
    /// Wrap raw archive bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Archive bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Give up ownership of the buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// An empty archive means "nothing to unzip"
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}
