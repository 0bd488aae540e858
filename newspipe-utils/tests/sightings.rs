mod common;

use newspipe_config::NewspipeConfig;
use newspipe_http::HttpClient;
use newspipe_utils::push_sighting_to_vulnerability_lookup;
use newspipe_utils::sighting::SightingOutcome;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE: &str = "https://news.example/articles/42";

fn client() -> HttpClient {
    HttpClient::new(Duration::from_secs(5), "Newspipe-test/1.0").expect("client")
}

fn config_for(base: String) -> NewspipeConfig {
    NewspipeConfig {
        vulnerability_auth_token: "tok".into(),
        vulnerability_lookup_base_url: base,
        ..NewspipeConfig::default()
    }
}

async fn respond(server: &MockServer, vuln: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path("/sighting/"))
        .and(body_partial_json(json!({ "vulnerability": vuln })))
        .respond_with(ResponseTemplate::new(status).set_body_string("{\"message\":\"ok\"}"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn one_post_per_identifier_in_order() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    respond(&server, "CVE-2024-0001", 201).await;
    respond(&server, "CVE-2024-0002", 500).await;
    respond(&server, "GHSA-xxxx-yyyy-zzzz", 200).await;

    let ids = ["CVE-2024-0001", "CVE-2024-0002", "GHSA-xxxx-yyyy-zzzz"];
    let report = push_sighting_to_vulnerability_lookup(
        &client(),
        &config_for(format!("{}/", server.uri())),
        ARTICLE,
        &ids,
    )
    .await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(
        report.outcomes[0],
        ("CVE-2024-0001".to_string(), SightingOutcome::Accepted(StatusCode::CREATED))
    );
    assert!(matches!(
        &report.outcomes[1].1,
        SightingOutcome::Rejected { status, .. } if *status == StatusCode::INTERNAL_SERVER_ERROR
    ));
    assert_eq!(
        report.outcomes[2].1,
        SightingOutcome::Accepted(StatusCode::OK)
    );
    assert_eq!(report.accepted(), 2);
    assert_eq!(report.failed(), 1);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
    for (req, id) in received.iter().zip(ids) {
        assert_eq!(req.headers.get("x-api-key").unwrap(), "tok");
        assert_eq!(
            req.headers.get("content-type").unwrap(),
            "application/json"
        );
        let body: Value = serde_json::from_slice(&req.body).unwrap();
        assert_eq!(
            body,
            json!({ "type": "seen", "source": ARTICLE, "vulnerability": id })
        );
    }
}

#[tokio::test]
async fn api_key_header_is_sent() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sighting/"))
        .and(header("x-api-key", "tok"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let report = push_sighting_to_vulnerability_lookup(
        &client(),
        &config_for(format!("{}/", server.uri())),
        ARTICLE,
        &["CVE-2023-4863"],
    )
    .await;

    assert_eq!(report.accepted(), 1);
}

#[tokio::test]
async fn unreachable_lookup_records_every_failure() {
    common::init_test_tracing();
    let dead_uri = {
        let dead = MockServer::start().await;
        dead.uri()
    };

    let ids = vec!["CVE-2024-1".to_string(), "CVE-2024-2".to_string()];
    let report = push_sighting_to_vulnerability_lookup(
        &client(),
        &config_for(format!("{dead_uri}/")),
        ARTICLE,
        &ids,
    )
    .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failed(), 2);
    assert!(report
        .outcomes
        .iter()
        .all(|(_, o)| matches!(o, SightingOutcome::Failed(_))));
    assert_eq!(report.outcomes[1].0, "CVE-2024-2");
}

#[tokio::test]
async fn invalid_base_url_fails_without_requests() {
    common::init_test_tracing();
    let report = push_sighting_to_vulnerability_lookup(
        &client(),
        &config_for("not a url".into()),
        ARTICLE,
        &["CVE-2024-1", "CVE-2024-2"],
    )
    .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.accepted(), 0);
}

#[tokio::test]
async fn empty_identifier_list_sends_nothing() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let ids: [&str; 0] = [];
    let report = push_sighting_to_vulnerability_lookup(
        &client(),
        &config_for(format!("{}/", server.uri())),
        ARTICLE,
        &ids,
    )
    .await;

    assert!(report.outcomes.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
