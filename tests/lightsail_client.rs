use std::time::Duration;

use lbattach::{
    AttachmentConfig, AttachmentError, AttachmentResource, LightsailClient, LightsailError,
    LoadBalancerApi, OperationHandle, OperationStatus, ProviderConfig, WaitError, WaitSpec,
    get_provider, wait,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TARGET: &str = "x-amz-target";

fn target(action: &str) -> String {
    format!("Lightsail_20161128.{}", action)
}

fn client(mock_server: &MockServer) -> LightsailClient {
    LightsailClient::with_base_url("us-east-1".to_string(), mock_server.uri()).unwrap()
}

fn fast_spec() -> WaitSpec {
    WaitSpec::default()
        .with_delay(Duration::ZERO)
        .with_poll_interval(Duration::from_millis(10))
        .with_timeout(Duration::from_secs(5))
}

fn operation_body(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "operation": {
            "id": id,
            "resourceName": "my-lb",
            "resourceType": "LoadBalancer",
            "isTerminal": false,
            "operationType": "AttachInstancesToLoadBalancer",
            "status": status
        }
    })
}

fn operations_body(id: &str) -> serde_json::Value {
    serde_json::json!({
        "operations": [{
            "id": id,
            "resourceName": "my-lb",
            "operationType": "AttachInstancesToLoadBalancer",
            "status": "Started"
        }]
    })
}

fn load_balancer_body(instances: &[&str]) -> serde_json::Value {
    let summary: Vec<serde_json::Value> = instances
        .iter()
        .map(|name| serde_json::json!({ "instanceName": name, "instanceHealth": "healthy" }))
        .collect();

    serde_json::json!({
        "loadBalancer": {
            "name": "my-lb",
            "state": "active",
            "instanceHealthSummary": summary
        }
    })
}

fn not_found_body() -> serde_json::Value {
    serde_json::json!({
        "__type": "NotFoundException",
        "message": "The LoadBalancer does not exist"
    })
}

async fn mount_operation(mock_server: &MockServer, status: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(TARGET, target("GetOperation").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("op-1", status)))
        .up_to_n_times(times)
        .expect(times)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_attach_instances_sends_json_protocol_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(TARGET, target("AttachInstancesToLoadBalancer").as_str()))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(body_json(serde_json::json!({
            "loadBalancerName": "my-lb",
            "instanceNames": ["web-1", "web-2"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operations_body("op-1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let operations = client(&mock_server)
        .attach_instances("my-lb", &["web-1".to_string(), "web-2".to_string()])
        .await
        .unwrap();

    assert_eq!(operations.len(), 1);
    assert_eq!(operations[0].id, "op-1");
    assert_eq!(operations[0].status, Some(OperationStatus::Started));
}

#[tokio::test]
async fn test_get_load_balancer_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("GetLoadBalancer").as_str()))
        .respond_with(ResponseTemplate::new(400).set_body_json(not_found_body()))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).get_load_balancer("my-lb").await;

    match result {
        Err(LightsailError::NotFound { message }) => {
            assert_eq!(message, "The LoadBalancer does not exist");
        }
        other => panic!("Expected LightsailError::NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_operation_without_payload_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("GetOperation").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).fetch_operation("op-1").await;

    match result {
        Err(LightsailError::MalformedResponse { action, .. }) => {
            assert_eq!(action, "GetOperation");
        }
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_operation_without_status_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("GetOperation").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "operation": { "id": "op-1", "resourceName": "my-lb" }
        })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let operation = client.fetch_operation("op-1").await.unwrap();
    assert_eq!(operation.status, None);

    match client.operation_status("op-1").await {
        Err(LightsailError::MalformedResponse { action, message }) => {
            assert_eq!(action, "GetOperation");
            assert!(message.contains("has no status"));
        }
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wait_polls_until_succeeded() {
    let mock_server = MockServer::start().await;
    mount_operation(&mock_server, "Started", 2).await;
    mount_operation(&mock_server, "Succeeded", 1).await;

    let status = wait(&client(&mock_server), &OperationHandle::new("op-1"), &fast_spec())
        .await
        .unwrap();

    assert_eq!(status, OperationStatus::Succeeded);
}

#[tokio::test]
async fn test_wait_reports_failed_operation() {
    let mock_server = MockServer::start().await;
    mount_operation(&mock_server, "Started", 1).await;
    mount_operation(&mock_server, "FAILED", 1).await;

    let err = wait(&client(&mock_server), &OperationHandle::new("op-2"), &fast_spec())
        .await
        .unwrap_err();

    match err {
        WaitError::OperationFailed { status, .. } => assert_eq!(status, OperationStatus::Failed),
        other => panic!("Expected OperationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wait_stops_on_access_denied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("GetOperation").as_str()))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "__type": "AccessDeniedException",
            "message": "not authorized"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = wait(&client(&mock_server), &OperationHandle::new("op-1"), &fast_spec())
        .await
        .unwrap_err();

    match err {
        WaitError::Fetch { cause, .. } => {
            assert!(!cause.retryable);
            assert!(cause.message.contains("not authorized"));
        }
        other => panic!("Expected Fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wait_retries_server_errors_until_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("GetOperation").as_str()))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "__type": "ServiceException",
            "message": "try again"
        })))
        .mount(&mock_server)
        .await;

    let spec = fast_spec().with_timeout(Duration::from_millis(200));
    let err = wait(&client(&mock_server), &OperationHandle::new("op-3"), &spec)
        .await
        .unwrap_err();

    match err {
        WaitError::Timeout {
            attempts,
            last_error,
            ..
        } => {
            assert!(attempts >= 2);
            assert!(last_error.unwrap().contains("ServiceException"));
        }
        other => panic!("Expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_attachment_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("AttachInstancesToLoadBalancer").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(operations_body("op-1")))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_operation(&mock_server, "Succeeded", 1).await;
    Mock::given(method("POST"))
        .and(header(TARGET, target("GetLoadBalancer").as_str()))
        .and(body_json(serde_json::json!({ "loadBalancerName": "my-lb" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_balancer_body(&["web-1", "web-2"])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ProviderConfig {
        region: "us-east-1".to_string(),
        endpoint: Some(mock_server.uri()),
    };
    let provider = get_provider("lightsail", &config).unwrap();
    let resource = AttachmentResource::new(provider.as_ref(), fast_spec());

    let state = resource
        .create(&AttachmentConfig::new("my-lb", ["web-1", "web-2"]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state.id, "my-lb");
    assert_eq!(state.instance_list(), vec!["web-1", "web-2"]);
}

#[tokio::test]
async fn test_create_waits_on_every_returned_operation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("AttachInstancesToLoadBalancer").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "operations": [
                { "id": "op-1", "resourceName": "my-lb", "status": "Started" },
                { "id": "op-2", "resourceName": "web-1", "status": "Started" }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    for id in ["op-1", "op-2"] {
        Mock::given(method("POST"))
            .and(header(TARGET, target("GetOperation").as_str()))
            .and(body_json(serde_json::json!({ "operationId": id })))
            .respond_with(ResponseTemplate::new(200).set_body_json(operation_body(id, "Succeeded")))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("POST"))
        .and(header(TARGET, target("GetLoadBalancer").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_balancer_body(&["web-1"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let resource = AttachmentResource::new(&client, fast_spec());

    let state = resource
        .create(&AttachmentConfig::new("my-lb", ["web-1"]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state.instance_list(), vec!["web-1"]);
}

#[tokio::test]
async fn test_create_without_operations_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("AttachInstancesToLoadBalancer").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "operations": [] })),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let resource = AttachmentResource::new(&client, fast_spec());

    let err = resource
        .create(&AttachmentConfig::new("my-lb", ["web-1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AttachmentError::NoOperations { .. }));
}

#[tokio::test]
async fn test_read_removes_missing_load_balancer_from_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("GetLoadBalancer").as_str()))
        .respond_with(ResponseTemplate::new(400).set_body_json(not_found_body()))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let resource = AttachmentResource::new(&client, fast_spec());

    assert_eq!(resource.read("my-lb").await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_fails_when_detach_operation_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("DetachInstancesFromLoadBalancer").as_str()))
        .and(body_json(serde_json::json!({
            "loadBalancerName": "my-lb",
            "instanceNames": ["web-1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operations_body("op-1")))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_operation(&mock_server, "Failed", 1).await;

    let client = client(&mock_server);
    let resource = AttachmentResource::new(&client, fast_spec());
    let state = lbattach::AttachmentState {
        id: "my-lb".to_string(),
        load_balancer_name: "my-lb".to_string(),
        instance_names: ["web-1".to_string()].into_iter().collect(),
    };

    let err = resource.delete(&state).await.unwrap_err();

    match err {
        AttachmentError::Wait { goal, source, .. } => {
            assert_eq!(goal, "become detached");
            assert!(matches!(source, WaitError::OperationFailed { .. }));
        }
        other => panic!("Expected Wait error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_reports_load_balancer_health() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header(TARGET, target("GetLoadBalancer").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_balancer_body(&["web-1"])))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let info = LoadBalancerApi::get_load_balancer(&client, "my-lb")
        .await
        .unwrap();

    assert_eq!(info.name, "my-lb");
    assert_eq!(info.instances.len(), 1);
    assert_eq!(info.instances[0].health, "healthy");
}
