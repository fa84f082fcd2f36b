//! Server responses and archives shared by the integration tests

use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;
use tmc_core::{RetryConfig, Settings};

/// Settings pointing at `server_url` with fast, jitter-free polling
pub fn settings(server_url: &str, workspace: &Path) -> Settings {
    Settings {
        server_url: server_url.to_string(),
        username: "student".to_string(),
        password: "secret".to_string(),
        workspace_dir: workspace.to_path_buf(),
        polling: RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 1.0,
            jitter: false,
        },
        ..Settings::default()
    }
}

/// Exercise template archive with one source file and one test
pub fn template_zip(exercise: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let files = [
        (format!("{exercise}/src/Main.java"), "class Main {}"),
        (format!("{exercise}/test/MainTest.java"), "class MainTest {}"),
    ];
    for (name, data) in files {
        writer
            .start_file(name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Exercise listing for course 1 with a single exercise
pub fn exercises_json(server_url: &str) -> String {
    format!(
        r#"{{"exercises":[{{
            "id":7,"name":"ex1","course_name":"mooc",
            "zip_url":"{0}/exercises/7.zip",
            "return_url":"{0}/exercises/7/submissions.json",
            "checksum":"abc","deadline":null
        }}]}}"#,
        server_url
    )
}

/// Upload reply for submission 9
pub fn upload_reply(server_url: &str) -> String {
    format!(
        r#"{{"submission_url":"{0}/submissions/9.json","paste_url":"{0}/paste/9"}}"#,
        server_url
    )
}

/// Graded result with one passing and one failing test
pub fn some_failed_result(server_url: &str) -> String {
    format!(
        r#"{{"status":"fail","all_tests_passed":false,
            "test_cases":[
                {{"name":"MainTest a","successful":true}},
                {{"name":"MainTest b","successful":false,"message":"expected 1"}}],
            "points":["1.1"],
            "feedback_questions":[{{"id":3,"question":"How hard?","kind":"intrange[1..5]"}}],
            "feedback_answer_url":"{0}/submissions/9/feedback"}}"#,
        server_url
    )
}

/// Matches requests whose raw body contains `needle`
///
/// Multipart uploads carry a deflated zip, so the string matchers never see them.
pub struct BodyContainsBytes(pub &'static [u8]);

impl wiremock::Match for BodyContainsBytes {
    fn matches(&self, request: &wiremock::Request) -> bool {
        request
            .body
            .windows(self.0.len())
            .any(|window| window == self.0)
    }
}
