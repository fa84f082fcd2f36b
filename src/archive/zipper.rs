use std::io::{Cursor, Write};
use std::sync::Arc;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ZipPolicy, entry_name};
use crate::domain::{Project, ZippedProject};
use crate::error::{Error, Result};
use crate::io::{FileIo, walk};

/// Packs a project directory into a submission archive
#[derive(Clone)]
pub struct ProjectZipper {
    io: Arc<dyn FileIo>,
}

impl ProjectZipper {
    /// Zipper reading through `io`
    pub fn new(io: Arc<dyn FileIo>) -> Self {
        Self { io }
    }

    /// Zip the project's tracked files
    ///
    /// Falls back to walking the root when the project was never scanned. A tracked
    /// file that disappeared since the scan fails the whole zip with an I/O error.
    pub fn zip_project(&self, project: &Project, policy: &ZipPolicy) -> Result<ZippedProject> {
        let root = &project.root_path;
        if root.as_os_str().is_empty() {
            return Err(Error::InvalidProject(format!(
                "project {} has no root directory",
                project.name()
            )));
        }
        if !self.io.is_dir(root) {
            return Err(Error::InvalidProject(format!(
                "project directory {} does not exist",
                root.display()
            )));
        }

        let mut paths = if project.files.is_empty() {
            walk(self.io.as_ref(), root)?
        } else {
            project.files.clone()
        };
        paths.sort();
        paths.dedup();

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut written = 0usize;

        if let Some(root_name) = entry_name(root, root) {
            writer.add_directory(format!("{root_name}/"), options)?;
        }

        for path in paths.iter().filter(|p| p.starts_with(root) && *p != root) {
            let Some(name) = entry_name(root, path) else {
                continue;
            };

            if self.io.is_dir(path) {
                let dir_name = format!("{name}/");
                if policy.should_zip(&dir_name) {
                    writer.add_directory(dir_name, options)?;
                }
                continue;
            }

            if !policy.should_zip(&name) {
                debug!(entry = %name, "excluded from submission");
                continue;
            }

            let data = self.io.read(path)?;
            writer.start_file(name, options)?;
            writer.write_all(&data)?;
            written += 1;
        }

        let bytes = writer.finish()?.into_inner();
        debug!(project = %project.name(), files = written, bytes = bytes.len(), "zipped project");
        Ok(ZippedProject::new(bytes))
    }
}
