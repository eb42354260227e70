//! The route table: one entry per pipeline lifecycle operation.
//!
//! Each route pairs an HTTP method and path pattern with the operation it
//! translates to, plus the binding rules the router applies before
//! dispatch: which request field the body decodes into, which path
//! captures are mandatory, which query keys are off limits, and which
//! response field gets unwrapped on the way out.

use http::Method;
use pipegate_core::model::{
    CreatePipelineRequest, DeletePipelineRequest, GetPipelineRequest, ListPipelinesRequest,
    StartPipelineRequest, StopPipelineRequest, UpdatePipelineRequest,
};
use pipegate_core::{MessageSchema, Pattern, PatternError, QueryFilter};

/// Unary operations of the pipeline service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePipeline,
    GetPipeline,
    ListPipelines,
    UpdatePipeline,
    DeletePipeline,
    StartPipeline,
    StopPipeline,
}

impl Operation {
    /// Full RPC method path used for dispatch and context annotation.
    pub fn rpc_method(&self) -> &'static str {
        match self {
            Operation::CreatePipeline => {
                "/redpanda.api.dataplane.v1alpha2.PipelineService/CreatePipeline"
            }
            Operation::GetPipeline => {
                "/redpanda.api.dataplane.v1alpha2.PipelineService/GetPipeline"
            }
            Operation::ListPipelines => {
                "/redpanda.api.dataplane.v1alpha2.PipelineService/ListPipelines"
            }
            Operation::UpdatePipeline => {
                "/redpanda.api.dataplane.v1alpha2.PipelineService/UpdatePipeline"
            }
            Operation::DeletePipeline => {
                "/redpanda.api.dataplane.v1alpha2.PipelineService/DeletePipeline"
            }
            Operation::StartPipeline => {
                "/redpanda.api.dataplane.v1alpha2.PipelineService/StartPipeline"
            }
            Operation::StopPipeline => {
                "/redpanda.api.dataplane.v1alpha2.PipelineService/StopPipeline"
            }
        }
    }

    /// Short operation name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreatePipeline => "CreatePipeline",
            Operation::GetPipeline => "GetPipeline",
            Operation::ListPipelines => "ListPipelines",
            Operation::UpdatePipeline => "UpdatePipeline",
            Operation::DeletePipeline => "DeletePipeline",
            Operation::StartPipeline => "StartPipeline",
            Operation::StopPipeline => "StopPipeline",
        }
    }
}

/// One HTTP binding of an operation.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: Pattern,
    pub operation: Operation,
    /// Request field the HTTP body decodes into. `None` means the route
    /// takes no body.
    pub body: Option<&'static str>,
    /// Path capture names that must bind into the request.
    pub path_fields: &'static [&'static str],
    /// Bindable leaf fields of the request message.
    pub schema: MessageSchema,
    /// Query keys dropped because the path already claims them.
    pub filter: QueryFilter,
    /// Response field unwrapped before encoding, when set.
    pub projection: Option<&'static str>,
}

const ID_ONLY: QueryFilter = QueryFilter::excluding(&["id"]);

/// Build the full route table. Patterns are compiled here so a bad
/// template fails at startup.
pub fn pipeline_routes() -> Result<Vec<Route>, PatternError> {
    Ok(vec![
        Route {
            method: Method::POST,
            pattern: Pattern::compile("/v1alpha2/redpanda-connect/pipelines")?,
            operation: Operation::CreatePipeline,
            body: Some("pipeline"),
            path_fields: &[],
            schema: CreatePipelineRequest::SCHEMA,
            filter: QueryFilter::ALL,
            projection: Some("pipeline"),
        },
        Route {
            method: Method::GET,
            pattern: Pattern::compile("/v1alpha2/redpanda-connect/pipelines/{id}")?,
            operation: Operation::GetPipeline,
            body: None,
            path_fields: &["id"],
            schema: GetPipelineRequest::SCHEMA,
            filter: ID_ONLY,
            projection: Some("pipeline"),
        },
        Route {
            method: Method::GET,
            pattern: Pattern::compile("/v1alpha2/redpanda-connect/pipelines")?,
            operation: Operation::ListPipelines,
            body: None,
            path_fields: &[],
            schema: ListPipelinesRequest::SCHEMA,
            filter: QueryFilter::ALL,
            projection: None,
        },
        Route {
            method: Method::PUT,
            pattern: Pattern::compile("/v1alpha2/redpanda-connect/pipelines/{id}")?,
            operation: Operation::UpdatePipeline,
            body: Some("pipeline"),
            path_fields: &["id"],
            schema: UpdatePipelineRequest::SCHEMA,
            filter: ID_ONLY,
            projection: Some("pipeline"),
        },
        Route {
            method: Method::DELETE,
            pattern: Pattern::compile("/v1alpha2/redpanda-connect/pipelines/{id}")?,
            operation: Operation::DeletePipeline,
            body: None,
            path_fields: &["id"],
            schema: DeletePipelineRequest::SCHEMA,
            filter: ID_ONLY,
            projection: None,
        },
        Route {
            method: Method::PUT,
            pattern: Pattern::compile("/v1alpha2/redpanda-connect/pipelines/{id}/stop")?,
            operation: Operation::StopPipeline,
            body: None,
            path_fields: &["id"],
            schema: StopPipelineRequest::SCHEMA,
            filter: ID_ONLY,
            projection: Some("pipeline"),
        },
        Route {
            method: Method::PUT,
            pattern: Pattern::compile("/v1alpha2/redpanda-connect/pipelines/{id}/start")?,
            operation: Operation::StartPipeline,
            body: None,
            path_fields: &["id"],
            schema: StartPipelineRequest::SCHEMA,
            filter: ID_ONLY,
            projection: Some("pipeline"),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_operation_once() {
        let table = pipeline_routes().expect("route table compiles");
        assert_eq!(table.len(), 7);
        let mut ops: Vec<&str> = table.iter().map(|r| r.operation.name()).collect();
        ops.sort_unstable();
        ops.dedup();
        assert_eq!(ops.len(), 7);
    }

    #[test]
    fn path_fields_appear_in_each_pattern_and_schema() {
        for route in pipeline_routes().unwrap() {
            let captures: Vec<&str> = route.pattern.capture_names().collect();
            for field in route.path_fields {
                assert!(captures.contains(field), "{} misses {field}", route.pattern.template());
                assert!(route.schema.lookup(field).is_some(), "{field} not in schema");
            }
        }
    }

    #[test]
    fn start_and_stop_are_distinct_put_routes() {
        let table = pipeline_routes().unwrap();
        let start = table
            .iter()
            .find(|r| r.operation == Operation::StartPipeline)
            .unwrap();
        assert_eq!(start.method, Method::PUT);
        assert!(start
            .pattern
            .matches("/v1alpha2/redpanda-connect/pipelines/p1/start")
            .is_some());
        assert!(start
            .pattern
            .matches("/v1alpha2/redpanda-connect/pipelines/p1/stop")
            .is_none());
    }

    #[test]
    fn rpc_methods_carry_the_service_package() {
        assert_eq!(
            Operation::GetPipeline.rpc_method(),
            "/redpanda.api.dataplane.v1alpha2.PipelineService/GetPipeline"
        );
    }
}
