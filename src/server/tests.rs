// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::config::RetryConfig;
use crate::domain::{FeedbackQuestion, SubmissionStatus};
use crate::error::ErrorKind;
use flate2::read::GzDecoder;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> Settings {
    Settings {
        server_url: server.uri(),
        username: "student".to_string(),
        password: "secret".to_string(),
        polling: RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Settings::default()
    }
}

fn manager(server: &MockServer) -> ServerManager {
    ServerManager::new(Arc::new(settings(server))).unwrap()
}

fn exercise(server: &MockServer) -> Exercise {
    Exercise {
        id: 1,
        name: "ex1".to_string(),
        return_url: format!("{}/exercises/1/submissions.json", server.uri()),
        ..Exercise::default()
    }
}

fn never() -> impl Fn() -> bool + Send + Sync {
    || false
}

#[tokio::test]
async fn courses_are_listed_with_client_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses"))
        .and(query_param("api_version", crate::config::API_VERSION.to_string()))
        .and(query_param("client", crate::config::CLIENT_NAME))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"courses":[{"id":1,"name":"mooc-2024","reviews_url":"http://x/reviews.json"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let courses = manager(&server).get_courses().await.unwrap();

    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].name, "mooc-2024");
}

#[tokio::test]
async fn null_course_list_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"courses":null}"#))
        .mount(&server)
        .await;

    assert!(manager(&server).get_courses().await.unwrap().is_empty());
}

#[tokio::test]
async fn unparsable_course_list_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    assert!(manager(&server).get_courses().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_server_lists_nothing() {
    let server = MockServer::builder().start().await;
    let settings = settings(&server);
    drop(server);

    let manager = ServerManager::new(Arc::new(settings)).unwrap();
    assert!(manager.get_courses().await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_still_reports_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = manager(&server).get_courses().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn exercises_get_parsed_deadlines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/5/exercises"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"exercises":[{"id":9,"name":"ex9","deadline":"2020-01-01T00:00:00+00:00"}]}"#,
        ))
        .mount(&server)
        .await;

    let exercises = manager(&server).get_exercises(5).await.unwrap();

    assert_eq!(exercises.len(), 1);
    assert!(exercises[0].deadline_at.is_some());
    assert!(exercises[0].has_deadline_passed());
}

#[tokio::test]
async fn exercise_zip_is_downloaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exercises/9.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04data".to_vec()))
        .mount(&server)
        .await;

    let zipped = manager(&server)
        .get_exercise_zip(&format!("{}/exercises/9.zip", server.uri()))
        .await
        .unwrap();
    assert_eq!(zipped.bytes(), b"PK\x03\x04data");
}

#[tokio::test]
async fn exercise_zip_transport_failure_is_empty() {
    let server = MockServer::builder().start().await;
    let settings = settings(&server);
    let zip_url = format!("{}/exercises/9.zip", server.uri());
    drop(server);

    let manager = ServerManager::new(Arc::new(settings)).unwrap();
    let zipped = manager.get_exercise_zip(&zip_url).await.unwrap();
    assert!(zipped.is_empty());
}

#[tokio::test]
async fn upload_sends_metadata_and_extras() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exercises/1/submissions.json"))
        .and(body_string_contains("name=\"client_time\""))
        .and(body_string_contains("name=\"client_nanotime\""))
        .and(body_string_contains("name=\"error_msg_locale\""))
        .and(body_string_contains("name=\"paste\""))
        .and(body_string_contains("name=\"submission[file]\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"submission_url":"http://h/submissions/1.json","paste_url":"http://h/paste/1"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let response = manager(&server)
        .upload_file(
            &exercise(&server),
            b"zip".to_vec(),
            &[("paste".to_string(), "1".to_string())],
        )
        .await
        .unwrap();

    assert_eq!(response.submission_url.as_str(), "http://h/submissions/1.json");
    assert_eq!(response.paste_url.as_str(), "http://h/paste/1");
}

#[tokio::test]
async fn upload_error_field_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exercises/1/submissions.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error":"Deadline has passed"}"#))
        .mount(&server)
        .await;

    let err = manager(&server)
        .upload_file(&exercise(&server), b"zip".to_vec(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SubmissionRejected(ref m) if m == "Deadline has passed"));
}

#[tokio::test]
async fn upload_to_obsolete_client_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exercises/1/submissions.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"obsolete_client":true}"#))
        .mount(&server)
        .await;

    let err = manager(&server)
        .upload_file(&exercise(&server), b"zip".to_vec(), &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ObsoleteClient);
}

#[tokio::test]
async fn polling_waits_through_processing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/submissions/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"processing"}"#))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/submissions/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"ok","all_tests_passed":true,"test_cases":[{"name":"A a","successful":true}]}"#,
        ))
        .with_priority(2)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/submissions/1.json", server.uri())).unwrap();
    let result = manager(&server)
        .wait_for_submission_result(&url, &never())
        .await
        .unwrap();

    assert_eq!(result.status, SubmissionStatus::AllPassed);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn polling_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/submissions/1.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/submissions/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"error","error":"boom"}"#))
        .with_priority(2)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/submissions/1.json", server.uri())).unwrap();
    let result = manager(&server)
        .wait_for_submission_result(&url, &never())
        .await
        .unwrap();

    assert_eq!(result.status, SubmissionStatus::Error);
    assert_eq!(result.error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn polling_gives_up_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/submissions/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"processing"}"#))
        .expect(5)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/submissions/1.json", server.uri())).unwrap();
    let err = manager(&server)
        .wait_for_submission_result(&url, &never())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ResultTimeout { polls: 5 }));
}

#[tokio::test]
async fn polling_stops_without_request_when_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"processing"}"#))
        .expect(0)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/submissions/1.json", server.uri())).unwrap();
    let err = manager(&server)
        .wait_for_submission_result(&url, &|| true)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn polling_stops_mid_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"processing"}"#))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.polling.initial_delay = Duration::from_secs(30);
    settings.polling.max_delay = Duration::from_secs(30);
    let manager = ServerManager::new(Arc::new(settings)).unwrap();

    let stopped = Arc::new(AtomicBool::new(false));
    let flag = stopped.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        flag.store(true, Ordering::SeqCst);
    });

    let url = Url::parse(&format!("{}/submissions/1.json", server.uri())).unwrap();
    let stop = move || stopped.load(Ordering::SeqCst);
    let err = tokio::time::timeout(
        Duration::from_secs(5),
        manager.wait_for_submission_result(&url, &stop),
    )
    .await
    .expect("stop should end the wait")
    .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn feedback_form_uses_indexed_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/feedback"))
        .and(body_string_contains("answers%5B0%5D%5Bquestion_id%5D=3"))
        .and(body_string_contains("answers%5B0%5D%5Banswer%5D=5"))
        .and(body_string_contains("answers%5B1%5D%5Bquestion_id%5D=4"))
        .and(body_string_contains("answers%5B1%5D%5Banswer%5D=nice"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let answers = vec![
        FeedbackAnswer::new(FeedbackQuestion::new(3, "Rate", "intrange[1..5]"), "5"),
        FeedbackAnswer::new(FeedbackQuestion::new(4, "Comments", "text"), "nice"),
    ];
    let reply = manager(&server)
        .submit_feedback(&format!("{}/feedback", server.uri()), &answers)
        .await
        .unwrap();
    assert_eq!(reply, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn event_logs_are_gzipped_with_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(header("X-Tmc-Version", "1"))
        .and(header("X-Tmc-Username", "student"))
        .and(header("X-Tmc-Password", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let events = vec![LoggableEvent::new("c", "ex1", "text_insert", b"abc".to_vec())];
    manager(&server)
        .send_event_logs(&format!("{}/events", server.uri()), &events)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let mut json = String::new();
    GzDecoder::new(requests[0].body.as_slice())
        .read_to_string(&mut json)
        .unwrap();
    let decoded: Vec<LoggableEvent> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, events);
}

#[tokio::test]
async fn reviews_are_downloaded_and_marked_read() {
    let server = MockServer::start().await;
    let update_url = format!("{}/reviews/3", server.uri());
    Mock::given(method("GET"))
        .and(path("/courses/1/reviews.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"reviews":[{{"id":3,"submission_id":7,"exercise_name":"ex1",
                "marked_as_read":false,"update_url":"{update_url}",
                "created_at":"2013-04-15T12:01:02+0300"}}]}}"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reviews/3.json"))
        .and(body_string("_method=put&mark_as_read=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let course = Course {
        id: 1,
        name: "c".to_string(),
        reviews_url: Some(format!("{}/courses/1/reviews.json", server.uri())),
        ..Course::default()
    };
    let manager = manager(&server);
    let reviews = manager.download_reviews(&course).await.unwrap();

    assert_eq!(reviews.len(), 1);
    assert!(reviews[0].created_at.is_some());
    manager.mark_review_as_read(&reviews[0]).await.unwrap();
}

#[tokio::test]
async fn course_without_reviews_url_has_no_reviews() {
    let server = MockServer::start().await;
    let course = Course::default();
    assert!(manager(&server).download_reviews(&course).await.unwrap().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
