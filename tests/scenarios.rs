//! End-to-end runs against a mock REST endpoint

mod common;

use common::Workspace;
use rest_request::{Error, NON_HTTP_STATUS, RemapRule, Runner, run};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn post_single_file_stores_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .and(body_string("hi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("PDF-BYTES"))
        .expect(1)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    ws.add_input("a.md", "hi");

    let summary = run(ws.config(&server)).await.expect("run should succeed");

    assert_eq!(summary.requests, 1);
    assert_eq!(ws.output_file("a.md").as_deref(), Some(&b"PDF-BYTES"[..]));
}

#[tokio::test]
async fn post_single_file_with_remapped_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("PDF-BYTES"))
        .mount(&server)
        .await;

    let ws = Workspace::new();
    ws.add_input("a.md", "hi");
    let config = rest_request::Config {
        file_mappers: vec![RemapRule::Extension {
            extension: "pdf".into(),
        }],
        ..ws.config(&server)
    };

    run(config).await.expect("run should succeed");

    assert_eq!(ws.output_file("a.pdf").as_deref(), Some(&b"PDF-BYTES"[..]));
    assert!(ws.output_file("a.md").is_none());
}

#[tokio::test]
async fn server_error_fails_run_with_file_and_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .expect(1)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let input = ws.add_input("a.md", "hi");

    let err = run(ws.config(&server)).await.expect_err("run should fail");

    let records = err.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, 500);
    assert_eq!(records[0].message, "server error");
    assert_eq!(records[0].file.as_deref(), Some(input.as_path()));
    assert!(ws.output_file("a.md").is_none());

    let report = err.to_string();
    assert!(report.contains("a.md"), "{report}");
    assert!(report.contains("500"), "{report}");
    assert!(
        report.contains(&format!("  {} [500:server error]", input.display())),
        "{report}"
    );
}

#[tokio::test]
async fn get_without_files_issues_one_bodyless_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("status: up"))
        .expect(1)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let config = rest_request::Config {
        method: "GET".into(),
        ..ws.config_without_files(&server)
    };

    let summary = run(config).await.expect("run should succeed");

    assert_eq!(summary.requests, 1);
    assert_eq!(ws.output_file("rest.file").as_deref(), Some(&b"status: up"[..]));
}

#[tokio::test]
async fn get_without_files_error_has_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let config = rest_request::Config {
        method: "GET".into(),
        ..ws.config_without_files(&server)
    };

    let err = run(config).await.expect_err("run should fail");
    assert_eq!(err.records().len(), 1);
    assert!(err.records()[0].file.is_none());
    assert_eq!(
        err.to_string(),
        "unable to process files:\n  [404:no such thing]"
    );
}

#[tokio::test]
async fn post_without_files_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let summary = run(ws.config(&server)).await.expect("run should succeed");

    assert_eq!(summary.requests, 0);
    assert!(summary.written.is_empty());
    assert_eq!(ws.output_count(), 0);
}

#[tokio::test]
async fn mixed_results_yield_one_record_per_failure() {
    let server = MockServer::start().await;
    for (body, status) in [("ok", 200), ("missing", 404), ("broken", 503)] {
        Mock::given(method("POST"))
            .and(body_string(body))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
    }

    let ws = Workspace::new();
    ws.add_input("1.txt", "ok");
    ws.add_input("2.txt", "missing");
    ws.add_input("3.txt", "ok");
    ws.add_input("4.txt", "broken");
    ws.add_input("5.txt", "ok");

    let err = run(ws.config(&server)).await.expect_err("run should fail");

    let codes: Vec<i32> = err.records().iter().map(|r| r.code).collect();
    assert_eq!(codes, vec![404, 503]);
    assert_eq!(ws.output_count(), 3);
    for name in ["1.txt", "3.txt", "5.txt"] {
        assert_eq!(ws.output_file(name).as_deref(), Some(&b"ok"[..]), "{name}");
    }
}

#[tokio::test]
async fn content_types_are_sent_as_configured() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(header("content-type", "text/markdown"))
        .and(header("accept", "application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .expect(1)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    ws.add_input("a.md", "# title");
    let config = rest_request::Config {
        method: "PUT".into(),
        request_type: "text/markdown".into(),
        response_type: "application/pdf".into(),
        ..ws.config(&server)
    };

    run(config).await.expect("run should succeed");
}

#[tokio::test]
async fn redirect_is_followed_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/moved", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(200).set_body_string("final"))
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let config = rest_request::Config {
        method: "GET".into(),
        ..ws.config_without_files(&server)
    };

    run(config).await.expect("run should succeed");
    assert_eq!(ws.output_file("rest.file").as_deref(), Some(&b"final"[..]));
}

#[tokio::test]
async fn redirect_is_an_error_when_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/moved", server.uri())),
        )
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let mut config = rest_request::Config {
        method: "GET".into(),
        ..ws.config_without_files(&server)
    };
    config.transport.follow_redirects = false;

    let err = run(config).await.expect_err("run should fail");
    assert_eq!(err.records()[0].code, 302);
}

#[tokio::test]
async fn nested_inputs_are_stored_by_base_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    ws.add_input("a.txt", "fine");
    ws.add_input("nested/deeper/c.txt", "x");
    let config = rest_request::Config {
        filesets: vec![rest_request::FileSetConfig::new(&ws.input)],
        ..ws.config_without_files(&server)
    };

    let summary = Runner::new(config)
        .expect("valid config")
        .run()
        .await
        .expect("run should succeed");

    assert_eq!(summary.requests, 2);
    assert!(ws.output_file("a.txt").is_some());
    assert!(ws.output_file("c.txt").is_some());
    assert_eq!(ws.output_count(), 2);
}

#[tokio::test]
async fn default_excludes_skip_vcs_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    ws.add_input("doc.md", "body");
    ws.add_input(".git/config", "[core]");

    let summary = run(ws.config(&server)).await.expect("run should succeed");
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.written, vec![ws.output.join("doc.md")]);
}

#[tokio::test]
async fn invalid_configuration_is_fatal() {
    let ws = Workspace::new();
    let server = MockServer::start().await;
    let config = rest_request::Config {
        method: "NOT VALID".into(),
        ..ws.config(&server)
    };

    let err = run(config).await.expect_err("run should fail");
    assert!(matches!(err, Error::Config { .. }), "{err:?}");
    assert_eq!(ws.output_count(), 0);
}

#[tokio::test]
async fn transport_failure_uses_non_http_status() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let endpoint = format!("http://{}/x", listener.local_addr().expect("addr"));
    drop(listener);

    let ws = Workspace::new();
    ws.add_input("a.md", "hi");
    let config = rest_request::Config {
        output_dir: ws.output.clone(),
        fileset: Some(rest_request::FileSetConfig::new(&ws.input)),
        ..rest_request::Config::new(endpoint)
    };

    let err = run(config).await.expect_err("run should fail");
    assert_eq!(err.records()[0].code, NON_HTTP_STATUS);
}
