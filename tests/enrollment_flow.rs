use queue_enroller::config::{DEFAULT_REGISTER_PATH, DEFAULT_SIGN_IN_PATH, ServiceConfig};
use queue_enroller::service::{AuthClient, QueueClient};
use queue_enroller::{BatchRunner, CallFailure, RowRecord, RowStatus, ServiceClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn row(n: usize) -> RowRecord {
    RowRecord::new()
        .with_field("login", format!("8801013001{:02}", n))
        .with_field("password", format!("pw{}", n))
        .with_field("childId", format!("{}", 500 + n))
        .with_field("classId", "3")
        .with_field("courseId", "11")
        .with_field("childName", format!("Child {}", n))
}

async fn expect_sign_in(server: &MockServer, n: usize, status: u16) {
    let response = if status == 200 || status == 202 {
        ResponseTemplate::new(status)
            .set_body_json(json!({ "token": { "token": format!("token-{}", n) } }))
    } else {
        ResponseTemplate::new(status)
    };

    Mock::given(method("POST"))
        .and(path(DEFAULT_SIGN_IN_PATH))
        .and(body_json(json!({
            "iin": format!("8801013001{:02}", n),
            "password": format!("pw{}", n),
        })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn expect_register(server: &MockServer, n: usize, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path(DEFAULT_REGISTER_PATH))
        .and(query_param("childId", format!("{}", 500 + n)))
        .and(query_param("classId", "3"))
        .and(query_param("courseId", "11"))
        .and(header("authorization", format!("Bearer token-{}", n)))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

fn runner_for(server: &MockServer) -> BatchRunner<AuthClient, QueueClient> {
    let (auth, queue) = ServiceClient::builder(ServiceConfig::new(server.uri()))
        .with_timeout(Some(Duration::from_secs(5)))
        .build()
        .unwrap()
        .into_parts();
    BatchRunner::new(auth, queue)
}

#[tokio::test]
async fn test_every_row_enrolled() {
    let server = MockServer::start().await;
    for n in 0..3 {
        expect_sign_in(&server, n, 200).await;
        expect_register(&server, n, 202, 1).await;
    }

    let rows: Vec<RowRecord> = (0..3).map(row).collect();
    let state = runner_for(&server).run(&rows).await.unwrap();

    assert_eq!(state.success_count(), 3);
    assert_eq!(state.progress(), 100.0);
    assert!(state.log().iter().all(|e| e.status == RowStatus::Success));
    assert_eq!(state.log()[2].child_name, "Child 2");
}

#[tokio::test]
async fn test_rejected_sign_in_skips_registration() {
    let server = MockServer::start().await;
    expect_sign_in(&server, 0, 200).await;
    expect_register(&server, 0, 200, 1).await;
    expect_sign_in(&server, 1, 401).await;
    expect_register(&server, 1, 200, 0).await;
    expect_sign_in(&server, 2, 202).await;
    expect_register(&server, 2, 202, 1).await;

    let rows: Vec<RowRecord> = (0..3).map(row).collect();
    let state = runner_for(&server).run(&rows).await.unwrap();

    let statuses: Vec<RowStatus> = state.log().iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![RowStatus::Success, RowStatus::AuthError, RowStatus::Success]
    );
    assert_eq!(state.log()[1].cause, Some(CallFailure::Rejected { status: 401 }));
    assert_eq!(state.success_count(), 2);
}

#[tokio::test]
async fn test_conflict_is_registration_error() {
    let server = MockServer::start().await;
    expect_sign_in(&server, 0, 200).await;
    expect_register(&server, 0, 409, 1).await;
    expect_sign_in(&server, 1, 200).await;
    expect_register(&server, 1, 200, 1).await;

    let rows: Vec<RowRecord> = (0..2).map(row).collect();
    let runner = runner_for(&server);
    let state = runner.run(&rows).await.unwrap();

    assert_eq!(state.status_of(0), Some(RowStatus::RegistrationError));
    assert_eq!(state.status_of(1), Some(RowStatus::Success));
    assert_eq!(state.success_count(), 1);
    assert_eq!(state.log()[0].cause, Some(CallFailure::Rejected { status: 409 }));
    assert_eq!(runner.state().success_count(), 1);
}

#[tokio::test]
async fn test_token_without_envelope_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_SIGN_IN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "flat" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_REGISTER_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = runner_for(&server).run(&[row(0)]).await.unwrap();

    assert_eq!(state.status_of(0), Some(RowStatus::AuthError));
    assert!(matches!(
        state.log()[0].cause,
        Some(CallFailure::MalformedResponse { .. })
    ));
}
