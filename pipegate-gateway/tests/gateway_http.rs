//! End-to-end translation tests against an in-process backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use pipegate_core::model::*;
use pipegate_core::{CallContext, PipelineService, RpcStatus};
use pipegate_gateway::Gateway;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

/// Backend fixture: records every typed request it receives and answers
/// with canned responses keyed off the request.
#[derive(Default)]
struct RecordingService {
    seen: Mutex<Vec<(&'static str, Value)>>,
}

impl RecordingService {
    fn record<T: serde::Serialize>(&self, op: &'static str, request: &T) {
        self.seen
            .lock()
            .unwrap()
            .push((op, serde_json::to_value(request).unwrap()));
    }

    fn last(&self, op: &'static str) -> Value {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| *name == op)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| panic!("no recorded {op} request"))
    }
}

#[async_trait]
impl PipelineService for RecordingService {
    async fn create_pipeline(
        &self,
        _ctx: &CallContext,
        request: CreatePipelineRequest,
    ) -> Result<CreatePipelineResponse, RpcStatus> {
        self.record("CreatePipeline", &request);
        let mut pipeline = request.pipeline;
        pipeline.id = "p-created".to_string();
        Ok(CreatePipelineResponse {
            pipeline: Some(pipeline),
        })
    }

    async fn get_pipeline(
        &self,
        ctx: &CallContext,
        request: GetPipelineRequest,
    ) -> Result<GetPipelineResponse, RpcStatus> {
        self.record("GetPipeline", &request);
        ctx.metadata_sink().send_header("x-backend", "fixture");
        if let Some(tenant) = ctx.inbound_value("x-tenant") {
            ctx.metadata_sink().send_header("x-tenant-echo", tenant);
        }
        match request.id.as_str() {
            "ghost" => Err(RpcStatus::not_found(format!(
                "pipeline {:?} not found",
                request.id
            ))),
            "hang" => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            _ => Ok(GetPipelineResponse {
                pipeline: Some(Pipeline {
                    id: request.id,
                    display_name: "demo".to_string(),
                    ..Pipeline::default()
                }),
            }),
        }
    }

    async fn list_pipelines(
        &self,
        _ctx: &CallContext,
        request: ListPipelinesRequest,
    ) -> Result<ListPipelinesResponse, RpcStatus> {
        self.record("ListPipelines", &request);
        Ok(ListPipelinesResponse {
            pipelines: vec![Pipeline {
                id: "p-1".to_string(),
                ..Pipeline::default()
            }],
            next_page_token: "next".to_string(),
        })
    }

    async fn update_pipeline(
        &self,
        _ctx: &CallContext,
        request: UpdatePipelineRequest,
    ) -> Result<UpdatePipelineResponse, RpcStatus> {
        self.record("UpdatePipeline", &request);
        Ok(UpdatePipelineResponse {
            pipeline: request.pipeline,
        })
    }

    async fn delete_pipeline(
        &self,
        _ctx: &CallContext,
        request: DeletePipelineRequest,
    ) -> Result<DeletePipelineResponse, RpcStatus> {
        self.record("DeletePipeline", &request);
        Ok(DeletePipelineResponse::default())
    }

    async fn start_pipeline(
        &self,
        _ctx: &CallContext,
        request: StartPipelineRequest,
    ) -> Result<StartPipelineResponse, RpcStatus> {
        self.record("StartPipeline", &request);
        Ok(StartPipelineResponse {
            pipeline: Some(Pipeline {
                id: request.id,
                state: PipelineState::Starting,
                ..Pipeline::default()
            }),
        })
    }

    async fn stop_pipeline(
        &self,
        _ctx: &CallContext,
        request: StopPipelineRequest,
    ) -> Result<StopPipelineResponse, RpcStatus> {
        self.record("StopPipeline", &request);
        Ok(StopPipelineResponse {
            pipeline: Some(Pipeline {
                id: request.id,
                state: PipelineState::Stopping,
                ..Pipeline::default()
            }),
        })
    }
}

fn fixture() -> (Arc<RecordingService>, Gateway) {
    let service = Arc::new(RecordingService::default());
    let gateway = Gateway::local(service.clone()).expect("gateway init");
    (service, gateway)
}

async fn call(
    gateway: &Gateway,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Value) {
    let bytes = body
        .map(|v| Bytes::from(serde_json::to_vec(&v).unwrap()))
        .unwrap_or_default();
    let mut builder = Request::builder().method(method).uri(uri);
    for (key, value) in headers {
        builder = builder.header(*key, *value);
    }
    let request = builder.body(Full::new(bytes)).unwrap();

    let response = gateway.handle(request, CancellationToken::new()).await;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).expect("response body is JSON");
    (status, headers, value)
}

#[tokio::test]
async fn create_wraps_body_and_projects_the_response() {
    let (service, gateway) = fixture();
    let (status, _, body) = call(
        &gateway,
        "POST",
        "/v1alpha2/redpanda-connect/pipelines",
        Some(json!({"displayName": "demo", "configYaml": "input: {}"})),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // Response is the bare pipeline, not a wrapper object.
    assert_eq!(body["id"], "p-created");
    assert_eq!(body["displayName"], "demo");

    let seen = service.last("CreatePipeline");
    assert_eq!(seen["pipeline"]["displayName"], "demo");
    assert_eq!(seen["pipeline"]["configYaml"], "input: {}");
}

#[tokio::test]
async fn get_binds_the_path_capture() {
    let (service, gateway) = fixture();
    let (status, headers, body) = call(
        &gateway,
        "GET",
        "/v1alpha2/redpanda-connect/pipelines/p-7",
        None,
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "p-7");
    assert_eq!(headers.get("grpc-metadata-x-backend").unwrap(), "fixture");
    assert_eq!(service.last("GetPipeline")["id"], "p-7");
}

#[tokio::test]
async fn list_binds_scalar_and_repeated_query_parameters() {
    let (service, gateway) = fixture();
    let (status, _, body) = call(
        &gateway,
        "GET",
        "/v1alpha2/redpanda-connect/pipelines?page_size=25&page_token=tok\
         &filter.states=STATE_RUNNING&filter.states=STATE_ERROR",
        None,
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // No projection on list: the wrapper stays.
    assert_eq!(body["nextPageToken"], "next");
    assert_eq!(body["pipelines"][0]["id"], "p-1");

    let seen = service.last("ListPipelines");
    assert_eq!(seen["pageSize"], 25);
    assert_eq!(seen["pageToken"], "tok");
    assert_eq!(
        seen["filter"]["states"],
        json!(["STATE_RUNNING", "STATE_ERROR"])
    );
}

#[tokio::test]
async fn update_merges_body_path_and_query() {
    let (service, gateway) = fixture();
    let (status, _, _) = call(
        &gateway,
        "PUT",
        "/v1alpha2/redpanda-connect/pipelines/p-9\
         ?pipeline.description=from-query&pipeline.display_name=ignored&id=also-ignored",
        Some(json!({"displayName": "from-body"})),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let seen = service.last("UpdatePipeline");
    assert_eq!(seen["id"], "p-9");
    assert_eq!(seen["pipeline"]["displayName"], "from-body");
    assert_eq!(seen["pipeline"]["description"], "from-query");
}

#[tokio::test]
async fn delete_returns_an_empty_object() {
    let (service, gateway) = fixture();
    let (status, _, body) = call(
        &gateway,
        "DELETE",
        "/v1alpha2/redpanda-connect/pipelines/p-3",
        None,
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert_eq!(service.last("DeletePipeline")["id"], "p-3");
}

#[tokio::test]
async fn start_and_stop_dispatch_to_their_operations() {
    let (_, gateway) = fixture();
    let (status, _, body) = call(
        &gateway,
        "PUT",
        "/v1alpha2/redpanda-connect/pipelines/p-1/start",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "STATE_STARTING");

    let (status, _, body) = call(
        &gateway,
        "PUT",
        "/v1alpha2/redpanda-connect/pipelines/p-1/stop",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "STATE_STOPPING");
}

#[tokio::test]
async fn unknown_route_yields_a_not_found_status_body() {
    let (_, gateway) = fixture();
    let (status, _, body) = call(&gateway, "GET", "/v1alpha2/unknown", None, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn wrong_method_on_a_known_path_is_not_found() {
    let (_, gateway) = fixture();
    let (status, _, body) = call(
        &gateway,
        "PATCH",
        "/v1alpha2/redpanda-connect/pipelines/p-1",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn backend_errors_pass_through_with_metadata() {
    let (_, gateway) = fixture();
    let (status, headers, body) = call(
        &gateway,
        "GET",
        "/v1alpha2/redpanda-connect/pipelines/ghost",
        None,
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 5);
    assert_eq!(body["message"], "pipeline \"ghost\" not found");
    // Metadata sent before the error still reaches the client.
    assert_eq!(headers.get("grpc-metadata-x-backend").unwrap(), "fixture");
}

#[tokio::test]
async fn bad_query_value_is_invalid_argument() {
    let (_, gateway) = fixture();
    let (status, _, body) = call(
        &gateway,
        "GET",
        "/v1alpha2/redpanda-connect/pipelines?page_size=many",
        None,
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("type mismatch, parameter: page_size"), "{message}");
}

#[tokio::test]
async fn malformed_body_is_invalid_argument() {
    let (_, gateway) = fixture();
    let request = Request::builder()
        .method("POST")
        .uri("/v1alpha2/redpanda-connect/pipelines")
        .body(Full::new(Bytes::from_static(b"{oops")))
        .unwrap();
    let response = gateway.handle(request, CancellationToken::new()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_resource_exhausted() {
    let service = Arc::new(RecordingService::default());
    let gateway = Gateway::local(service)
        .expect("gateway init")
        .with_max_body_bytes(16);
    let (status, _, body) = call(
        &gateway,
        "POST",
        "/v1alpha2/redpanda-connect/pipelines",
        Some(json!({"displayName": "a name that is longer than sixteen bytes"})),
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 8);
}

#[tokio::test]
async fn inbound_metadata_reaches_the_backend() {
    let (_, gateway) = fixture();
    let (status, headers, _) = call(
        &gateway,
        "GET",
        "/v1alpha2/redpanda-connect/pipelines/p-1",
        None,
        &[("grpc-metadata-x-tenant", "acme")],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("grpc-metadata-x-tenant-echo").unwrap(), "acme");
}

#[tokio::test]
async fn cancellation_aborts_a_hung_call() {
    let (_, gateway) = fixture();
    let token = CancellationToken::new();
    let request = Request::builder()
        .method("GET")
        .uri("/v1alpha2/redpanda-connect/pipelines/hang")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let handle = gateway.handle(request, token.clone());
    tokio::pin!(handle);
    // Let the call reach the backend, then pull the plug.
    tokio::select! {
        _ = &mut handle => panic!("call finished before cancellation"),
        _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => {}
    }
    token.cancel();
    let response = handle.await;

    assert_eq!(response.status().as_u16(), 499);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["code"], 1);
}
