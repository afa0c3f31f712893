// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end pipeline runs against a mocked upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flowgate_mapping::{FieldType, MappingEntry, MappingTable, SourceField, TargetField};
use flowgate_pipeline::{
    CallJob, CancellationToken, Control, FnJob, HttpMethod, InspectJob, JobError, MappingJob,
    Pipeline, PipelineContext, PipelineError, PipelineState, RequestDescriptor, StepConfig,
};
use flowgate_tree::TreeNode;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    User,
    Orders,
    Profile,
}

fn profile_table() -> MappingTable {
    MappingTable::new()
        .with_entry(MappingEntry::new(
            SourceField::new("user", "email", FieldType::String),
            TargetField::new("profile", "contact"),
        ))
        .with_entry(MappingEntry::new(
            SourceField::new("user", "age", FieldType::Integer),
            TargetField::new("profile", "age"),
        ))
}

async fn user_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"email": "a@b.com", "age": 36, "ignored": true}
        })))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_call_then_map() {
    let server = user_server().await;
    let descriptor = RequestDescriptor::new(HttpMethod::Get, server.uri())
        .path("/users/1")
        .bearer_token("secret");

    let pipeline = Pipeline::new("profile")
        .then(CallJob::new(Key::User, descriptor, reqwest::Client::new()))
        .then(InspectJob::new(Key::User))
        .then(MappingJob::new(Key::User, profile_table()).also_store_as(Key::Profile));

    let run = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await;

    assert_eq!(run.state, PipelineState::Succeeded);
    assert_eq!(run.context().response(&Key::User).map(|r| r.status), Some(200));
    assert!(run.context().tree(&Key::Profile).is_some());

    let result = run.into_result().unwrap();
    assert_eq!(
        Value::from(result),
        json!({"profile": {"contact": "a@b.com", "age": 36}})
    );
}

#[tokio::test]
async fn test_pipeline_from_config() {
    let server = user_server().await;
    let steps: Vec<StepConfig> = serde_json::from_value(json!([
        {"call": {"key": "user", "request": {
            "method": "GET",
            "baseUrl": server.uri(),
            "path": "/users/1",
            "token": "secret"
        }}},
        {"map": {"source": "user", "entries": [
            {"from": {"path": "user", "key": "age", "type": "integer"},
             "to": {"key": "age", "type": "string"}}
        ]}}
    ]))
    .unwrap();

    let pipeline =
        Pipeline::<String>::from_config("configured", &steps, &reqwest::Client::new()).unwrap();
    let result = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await
        .into_result()
        .unwrap();

    assert_eq!(Value::from(result), json!({"age": "36"}));
}

// ============================================================================
// Failure and short-circuit
// ============================================================================

#[tokio::test]
async fn test_failure_short_circuits() {
    let ran = Arc::new(Mutex::new(Vec::new()));
    let record = |name: &'static str, key: Key| {
        let ran = ran.clone();
        move |ctx: &mut PipelineContext<Key>, _: &Control| {
            ran.lock().unwrap().push(name);
            ctx.insert(key.clone(), TreeNode::from(json!({"written_by": name})));
            Ok::<(), JobError>(())
        }
    };

    let pipeline = Pipeline::new("short-circuit")
        .then(FnJob::new("j1", record("j1", Key::User)))
        .then(FnJob::new("j2", |ctx: &mut PipelineContext<Key>, _: &Control| {
            ctx.insert(Key::Orders, TreeNode::from(json!({"written_by": "j2"})));
            Err(JobError::custom("upstream rejected"))
        }))
        .then(FnJob::new("j3", record("j3", Key::Profile)));

    let run = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await;

    assert_eq!(run.state, PipelineState::Failed);
    assert_eq!(*ran.lock().unwrap(), vec!["j1"]);
    // j2 failed, so its write is rolled back; j3 never ran
    assert_eq!(run.context().keys().collect::<Vec<_>>(), vec![&Key::User]);
    assert_eq!(
        run.context().tree(&Key::User).map(|t| t.get_string("written_by")),
        Some("j1")
    );
    match run.into_result() {
        Err(PipelineError::Job { job, .. }) => assert_eq!(job, "j2"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_upstream_fails_run() {
    let descriptor = RequestDescriptor::new(HttpMethod::Get, "http://127.0.0.1:1").path("/users");
    let pipeline = Pipeline::new("unreachable")
        .then(CallJob::new(Key::User, descriptor, reqwest::Client::new()))
        .then(MappingJob::new(Key::User, profile_table()));

    let run = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await;

    assert_eq!(run.state, PipelineState::Failed);
    assert!(run.context().final_result().is_none());
    assert!(run.context().is_empty());

    let err = run.into_result().unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.error_code(), "TRANSPORT_ERROR");
}

#[tokio::test]
async fn test_context_keeps_earlier_values_after_failure() {
    let server = user_server().await;
    let descriptor = RequestDescriptor::new(HttpMethod::Get, server.uri())
        .path("/users/1")
        .bearer_token("secret");

    let pipeline = Pipeline::new("partial")
        .then(CallJob::new(Key::User, descriptor, reqwest::Client::new()))
        // nothing stored under Orders
        .then(MappingJob::new(Key::Orders, profile_table()));

    let run = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await;

    let (state, context, error) = run.into_parts();
    assert_eq!(state, PipelineState::Failed);
    assert!(context.response(&Key::User).is_some());
    assert!(matches!(
        error,
        Some(PipelineError::Job {
            source: JobError::MissingContextValue(_),
            ..
        })
    ));
}

// ============================================================================
// Parse modes
// ============================================================================

async fn html_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_strict_parse_fails_on_html_body() {
    let server = html_server().await;
    let pipeline = Pipeline::new("strict")
        .then(CallJob::new(
            Key::User,
            RequestDescriptor::new(HttpMethod::Get, server.uri()),
            reqwest::Client::new(),
        ))
        .then(MappingJob::new(Key::User, profile_table()));

    let err = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await
        .into_result()
        .unwrap_err();

    assert!(!err.is_transport());
    assert_eq!(err.error_code(), "JOB_FAILED");
}

#[tokio::test]
async fn test_lenient_parse_maps_zero_values() {
    let server = html_server().await;
    let pipeline = Pipeline::new("lenient")
        .then(CallJob::new(
            Key::User,
            RequestDescriptor::new(HttpMethod::Get, server.uri()),
            reqwest::Client::new(),
        ))
        .then(MappingJob::new(Key::User, profile_table()).lenient());

    let result = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await
        .into_result()
        .unwrap();

    assert_eq!(
        Value::from(result),
        json!({"profile": {"contact": "", "age": 0}})
    );
}

// ============================================================================
// Control: early completion and cancellation
// ============================================================================

#[tokio::test]
async fn test_early_completion_skips_remaining_jobs() {
    let later = Arc::new(AtomicUsize::new(0));
    let counter = later.clone();

    let pipeline = Pipeline::new("early")
        .then(FnJob::new(
            "short-circuit-ok",
            |ctx: &mut PipelineContext<Key>, control: &Control| {
                ctx.set_final_result(TreeNode::from(json!({"cached": true})));
                control.complete();
                Ok(())
            },
        ))
        .then(FnJob::new(
            "never",
            move |_: &mut PipelineContext<Key>, _: &Control| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        ));

    let result = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await
        .into_result()
        .unwrap();

    assert_eq!(Value::from(result), json!({"cached": true}));
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let pipeline = Pipeline::new("slow").then(CallJob::new(
        Key::User,
        RequestDescriptor::new(HttpMethod::Get, server.uri()),
        reqwest::Client::new(),
    ));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let run = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run(PipelineContext::new(), token),
    )
    .await
    .expect("cancellation should end the run promptly");

    assert_eq!(run.state, PipelineState::Failed);
    let err = run.into_result().unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.error_code(), "CANCELLED");
}

#[tokio::test]
async fn test_nested_pipeline_shares_context() {
    let seed = Pipeline::new("seed").then(FnJob::new(
        "seed-user",
        |ctx: &mut PipelineContext<Key>, _: &Control| {
            ctx.insert(
                Key::User,
                TreeNode::from(json!({"user": {"email": "n@e.st", "age": "9"}})),
            );
            Ok(())
        },
    ));

    let pipeline = Pipeline::new("outer")
        .then(seed)
        .then(MappingJob::new(Key::User, profile_table()));

    let result = pipeline
        .run(PipelineContext::new(), CancellationToken::new())
        .await
        .into_result()
        .unwrap();

    // "9" is a string, so the fail-soft integer read yields zero
    assert_eq!(
        Value::from(result),
        json!({"profile": {"contact": "n@e.st", "age": 0}})
    );
}
