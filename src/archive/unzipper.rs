use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::ZipPolicy;
use crate::domain::ZippedProject;
use crate::error::Result;
use crate::io::FileIo;

/// Upper bound on buffer space reserved from an entry's declared size
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Extracts downloaded exercise archives into the workspace
#[derive(Clone)]
pub struct ProjectUnzipper {
    io: Arc<dyn FileIo>,
}

impl ProjectUnzipper {
    /// Unzipper writing through `io`
    pub fn new(io: Arc<dyn FileIo>) -> Self {
        Self { io }
    }

    /// Extract `zipped` below `dest`, returning the number of files written
    ///
    /// An empty archive writes nothing. Entries whose names escape `dest` and
    /// entries the policy refuses are skipped.
    pub fn unzip(&self, zipped: &ZippedProject, dest: &Path, policy: &ZipPolicy) -> Result<usize> {
        if zipped.is_empty() {
            return Ok(0);
        }

        let mut archive = ZipArchive::new(Cursor::new(zipped.bytes()))?;
        let mut written = 0usize;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;

            let Some(relative) = entry.enclosed_name().map(PathBuf::from) else {
                warn!(entry = %entry.name(), "skipping entry with unsafe path");
                continue;
            };
            let name = slash_name(&relative);

            if !policy.should_unzip(&name) {
                debug!(entry = %name, "keeping local copy");
                continue;
            }

            let target = dest.join(&relative);
            if entry.is_dir() {
                self.io.create_dir_all(&target)?;
                continue;
            }

            let mut data = Vec::with_capacity(initial_capacity(entry.size()));
            entry.read_to_end(&mut data)?;
            self.io.write(&target, &data)?;
            written += 1;
        }

        debug!(dest = %dest.display(), files = written, "unzipped archive");
        Ok(written)
    }
}

// declared sizes come from the archive header and are not trusted
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0)
}

fn slash_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
