use std::sync::Arc;
use tracing::debug;

use super::{FileIo, walk};
use crate::domain::{Project, ProjectStatus};
use crate::error::Result;

/// Refreshes a project's tracked files and status from disk
pub struct ProjectScanner {
    io: Arc<dyn FileIo>,
}

impl ProjectScanner {
    /// Scanner over the given file system
    pub fn new(io: Arc<dyn FileIo>) -> Self {
        Self { io }
    }

    /// Re-list the project's files and set its status
    ///
    /// A project whose root exists becomes `Downloaded`, otherwise
    /// `NotDownloaded` with no tracked files. Deleted projects are left alone.
    pub fn update_project(&self, project: &mut Project) -> Result<()> {
        if project.status == ProjectStatus::Deleted {
            return Ok(());
        }

        let root = project.root_path.clone();
        if root.as_os_str().is_empty() || !self.io.is_dir(&root) {
            project.files.clear();
            project.status = ProjectStatus::NotDownloaded;
            return Ok(());
        }

        project.files = walk(self.io.as_ref(), &root)?;
        project.status = ProjectStatus::Downloaded;
        debug!(project = %project.name(), files = project.files.len(), "scanned project");
        Ok(())
    }
}
