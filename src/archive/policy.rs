use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use crate::domain::{Project, ProjectType};

static MAVEN_REJECT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^/]+/(target|lib/testrunner)/.*"));

/// Which archive entries are written when zipping and extracted when unzipping
///
/// Selected once per project by [`ZipPolicy::for_project`]; both predicates take
/// an entry name relative to the project root's parent, e.g. `ex1/src/Main.java`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZipPolicy {
    /// First download of a project that is not known locally yet
    AcceptAll,
    /// Ant, Makefile and unknown projects
    Default {
        /// Student files under `<project>/src/` that already exist locally
        existing_student_files: HashSet<String>,
    },
    /// Maven projects
    Maven {
        /// Student files under `<project>/src/main/` that already exist locally
        existing_student_files: HashSet<String>,
    },
}

impl ZipPolicy {
    /// Policy for `project`, or [`ZipPolicy::AcceptAll`] when there is none yet
    pub fn for_project(project: Option<&Project>) -> Self {
        let Some(project) = project else {
            return ZipPolicy::AcceptAll;
        };

        match project.project_type {
            ProjectType::JavaMaven => ZipPolicy::Maven {
                existing_student_files: student_files(project, "src/main/"),
            },
            ProjectType::JavaAnt | ProjectType::Makefile | ProjectType::Unknown => {
                ZipPolicy::Default {
                    existing_student_files: student_files(project, "src/"),
                }
            }
        }
    }

    /// Whether the entry belongs in a submission archive
    pub fn should_zip(&self, entry: &str) -> bool {
        match self {
            ZipPolicy::Maven { .. } => !MAVEN_REJECT
                .as_ref()
                .map(|re| re.is_match(entry))
                .unwrap_or(false),
            ZipPolicy::AcceptAll | ZipPolicy::Default { .. } => true,
        }
    }

    /// Whether the entry may be written over the local copy
    ///
    /// Student work that already exists on disk is never overwritten.
    pub fn should_unzip(&self, entry: &str) -> bool {
        match self {
            ZipPolicy::AcceptAll => true,
            ZipPolicy::Default {
                existing_student_files,
            }
            | ZipPolicy::Maven {
                existing_student_files,
            } => !existing_student_files.contains(entry),
        }
    }
}

/// Entry name for `path` relative to the parent of `root`, `/`-separated
pub fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let base = root.parent().unwrap_or(root);
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn student_files(project: &Project, source_dir: &str) -> HashSet<String> {
    let Some(project_dir) = entry_name(&project.root_path, &project.root_path) else {
        return HashSet::new();
    };
    let prefix = format!("{project_dir}/{source_dir}");

    project
        .files
        .iter()
        .filter_map(|path| entry_name(&project.root_path, path))
        .filter(|name| name.starts_with(&prefix))
        .collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn project(project_type: ProjectType, files: &[&str]) -> Project {
        let mut project = Project::new(None, "/ws/course/ex1").with_type(project_type);
        project.files = files.iter().map(PathBuf::from).collect();
        project
    }

    #[test]
    fn no_project_accepts_everything() {
        let policy = ZipPolicy::for_project(None);
        assert_eq!(policy, ZipPolicy::AcceptAll);
        assert!(policy.should_zip("ex1/target/classes/A.class"));
        assert!(policy.should_unzip("ex1/src/A.java"));
    }

    #[test]
    fn maven_rejects_build_output_and_testrunner() {
        let policy = ZipPolicy::for_project(Some(&project(ProjectType::JavaMaven, &[])));

        assert!(!policy.should_zip("ex1/target/classes/A.class"));
        assert!(!policy.should_zip("ex1/lib/testrunner/runner.jar"));
        assert!(policy.should_zip("ex1/src/main/java/A.java"));
        assert!(policy.should_zip("ex1/lib/other.jar"));
        assert!(policy.should_zip("ex1/pom.xml"));
        // only the first segment is the project directory
        assert!(policy.should_zip("ex1/sub/target/x"));
    }

    #[test]
    fn ant_makefile_and_unknown_share_default_policy() {
        for project_type in [ProjectType::JavaAnt, ProjectType::Makefile, ProjectType::Unknown] {
            let policy = ZipPolicy::for_project(Some(&project(project_type, &[])));
            assert!(matches!(policy, ZipPolicy::Default { .. }));
            assert!(policy.should_zip("ex1/target/classes/A.class"));
        }
    }

    #[test]
    fn default_keeps_existing_student_sources() {
        let policy = ZipPolicy::for_project(Some(&project(
            ProjectType::JavaAnt,
            &["/ws/course/ex1/src/A.java", "/ws/course/ex1/build.xml"],
        )));

        assert!(!policy.should_unzip("ex1/src/A.java"));
        assert!(policy.should_unzip("ex1/src/B.java"));
        assert!(policy.should_unzip("ex1/build.xml"));
        assert!(policy.should_unzip("ex1/test/ATest.java"));
    }

    #[test]
    fn maven_protects_only_main_sources() {
        let policy = ZipPolicy::for_project(Some(&project(
            ProjectType::JavaMaven,
            &[
                "/ws/course/ex1/src/main/java/A.java",
                "/ws/course/ex1/src/test/java/ATest.java",
            ],
        )));

        assert!(!policy.should_unzip("ex1/src/main/java/A.java"));
        assert!(policy.should_unzip("ex1/src/test/java/ATest.java"));
    }

    #[test]
    fn entry_names_are_relative_to_root_parent() {
        let root = Path::new("/ws/course/ex1");
        assert_eq!(
            entry_name(root, Path::new("/ws/course/ex1/src/A.java")).as_deref(),
            Some("ex1/src/A.java")
        );
        assert_eq!(entry_name(root, root).as_deref(), Some("ex1"));
        assert_eq!(entry_name(root, Path::new("/elsewhere/x")), None);
    }
}
