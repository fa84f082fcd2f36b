use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::archive::{ProjectUnzipper, ZipPolicy};
use crate::domain::{Exercise, Project};
use crate::error::{Error, Result};
use crate::io::{FileIo, ProjectScanner};
use crate::server::ServerManager;

/// Downloads exercise templates into the workspace
///
/// Archives are unpacked below `<workspace>/<course>/`; each archive holds a
/// single top-level directory named after the exercise.
pub struct ProjectDownloader {
    server: Arc<ServerManager>,
    unzipper: ProjectUnzipper,
    scanner: ProjectScanner,
    workspace_dir: PathBuf,
}

impl ProjectDownloader {
    /// Downloader writing through `io` below `workspace_dir`
    pub fn new(server: Arc<ServerManager>, io: Arc<dyn FileIo>, workspace_dir: PathBuf) -> Self {
        Self {
            server,
            unzipper: ProjectUnzipper::new(io.clone()),
            scanner: ProjectScanner::new(io),
            workspace_dir,
        }
    }

    /// Where the project for `exercise` lives
    ///
    /// Fails when the server-supplied course or exercise name is not a single
    /// plain path component.
    pub fn project_root(&self, exercise: &Exercise) -> Result<PathBuf> {
        Ok(self
            .course_dir(exercise)?
            .join(single_component("exercise", &exercise.name)?))
    }

    fn course_dir(&self, exercise: &Exercise) -> Result<PathBuf> {
        if exercise.course_name.is_empty() {
            Ok(self.workspace_dir.clone())
        } else {
            Ok(self
                .workspace_dir
                .join(single_component("course", &exercise.course_name)?))
        }
    }

    /// Download and unpack `exercise`, returning the scanned project
    ///
    /// `existing` is the local project if one is already known; its student sources
    /// are kept. Returns `Ok(None)` when the server sent an empty archive.
    pub async fn download_exercise(
        &self,
        exercise: &Exercise,
        existing: Option<&Project>,
    ) -> Result<Option<Project>> {
        if exercise.download_url.trim().is_empty() {
            return Err(Error::InvalidProject(format!(
                "exercise {} has no download URL",
                exercise.name
            )));
        }

        let dest = self.course_dir(exercise)?;
        let root = self.project_root(exercise)?;

        let zipped = self.server.get_exercise_zip(&exercise.download_url).await?;
        if zipped.is_empty() {
            warn!(exercise = %exercise.name, "server returned an empty archive");
            return Ok(None);
        }

        let policy = ZipPolicy::for_project(existing);
        let unzipper = self.unzipper.clone();
        let unzip_dest = dest.clone();
        let written = tokio::task::spawn_blocking(move || unzipper.unzip(&zipped, &unzip_dest, &policy))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(format!("unzipping task failed: {e}"))))??;

        let mut project = match existing {
            Some(project) => project.clone(),
            None => Project::new(None, root),
        };
        project.exercise = Some(exercise.clone());
        self.scanner.update_project(&mut project)?;

        info!(
            exercise = %exercise.name,
            dest = %dest.display(),
            files = written,
            "exercise downloaded"
        );
        Ok(Some(project))
    }
}

// names are joined onto the workspace, so separators, `..` and roots are refused
fn single_component<'a>(kind: &str, name: &'a str) -> Result<&'a Path> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(path),
        _ => Err(Error::InvalidProject(format!("unsafe {kind} name from server: {name:?}"))),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::{ProjectStatus, ProjectType};
    use crate::io::LocalFileIo;
    use std::io::{Cursor, Write};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::FileOptions;

    fn template_zip() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in [("ex1/src/A.java", "template"), ("ex1/test/ATest.java", "test")] {
            writer.start_file(name, FileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    async fn downloader(server: &MockServer, workspace: PathBuf) -> ProjectDownloader {
        let settings = Settings {
            server_url: server.uri(),
            ..Settings::default()
        };
        let manager = Arc::new(ServerManager::new(Arc::new(settings)).unwrap());
        ProjectDownloader::new(manager, Arc::new(LocalFileIo), workspace)
    }

    fn exercise(server: &MockServer) -> Exercise {
        Exercise {
            id: 1,
            name: "ex1".to_string(),
            course_name: "mooc".to_string(),
            download_url: format!("{}/exercises/1.zip", server.uri()),
            ..Exercise::default()
        }
    }

    #[tokio::test]
    async fn new_exercise_is_unpacked_and_scanned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exercises/1.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(template_zip()))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = downloader(&server, dir.path().to_path_buf()).await;
        let project = downloader
            .download_exercise(&exercise(&server), None)
            .await
            .unwrap()
            .unwrap();

        let root = dir.path().join("mooc/ex1");
        assert_eq!(project.root_path, root);
        assert_eq!(project.status, ProjectStatus::Downloaded);
        assert!(project.files.contains(&root.join("src/A.java")));
        assert_eq!(project.exercise.unwrap().name, "ex1");
    }

    #[tokio::test]
    async fn redownload_keeps_student_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exercises/1.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(template_zip()))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("mooc/ex1");
        LocalFileIo.write(&root.join("src/A.java"), b"my solution").unwrap();

        let mut existing = Project::new(None, &root).with_type(ProjectType::JavaAnt);
        existing.files = vec![root.join("src/A.java")];

        let downloader = downloader(&server, dir.path().to_path_buf()).await;
        downloader
            .download_exercise(&exercise(&server), Some(&existing))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(std::fs::read_to_string(root.join("src/A.java")).unwrap(), "my solution");
        assert!(root.join("test/ATest.java").exists());
    }

    #[tokio::test]
    async fn names_escaping_the_workspace_are_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(template_zip()))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader(&server, dir.path().join("ws")).await;

        let unsafe_names = [
            ("..", "ex1"),
            ("mooc", ".."),
            ("/etc", "ex1"),
            ("mooc", "a/b"),
            ("mooc", "a\\b"),
            ("mooc", ""),
        ];
        for (course, name) in unsafe_names {
            let exercise = Exercise {
                course_name: course.to_string(),
                name: name.to_string(),
                ..exercise(&server)
            };
            assert!(downloader.project_root(&exercise).is_err(), "{course:?}/{name:?}");
            let err = downloader.download_exercise(&exercise, None).await.unwrap_err();
            assert!(matches!(err, Error::InvalidProject(_)));
        }
        assert!(!dir.path().join("ex1").exists());
    }

    #[tokio::test]
    async fn empty_archive_yields_no_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = downloader(&server, dir.path().to_path_buf()).await;
        let project = downloader.download_exercise(&exercise(&server), None).await.unwrap();

        assert!(project.is_none());
        assert!(!dir.path().join("mooc/ex1").exists());
    }
}
