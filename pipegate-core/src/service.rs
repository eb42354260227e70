//! The pipeline service contract.
//!
//! In-process backends implement [`PipelineService`] and get mounted on
//! the gateway directly; the gateway's remote mode speaks the same
//! contract over the wire instead. Methods return [`RpcStatus`] so a
//! backend controls exactly what status code and message the client sees.

use async_trait::async_trait;

use crate::context::CallContext;
use crate::error::RpcStatus;
use crate::model::{
    CreatePipelineRequest, CreatePipelineResponse, DeletePipelineRequest, DeletePipelineResponse,
    GetPipelineRequest, GetPipelineResponse, ListPipelinesRequest, ListPipelinesResponse,
    StartPipelineRequest, StartPipelineResponse, StopPipelineRequest, StopPipelineResponse,
    UpdatePipelineRequest, UpdatePipelineResponse,
};

/// Unary pipeline lifecycle operations.
///
/// Implementations may attach response metadata through
/// [`CallContext::metadata_sink`] and should treat the context's
/// cancellation token as a request to stop early.
#[async_trait]
pub trait PipelineService: Send + Sync {
    async fn create_pipeline(
        &self,
        ctx: &CallContext,
        request: CreatePipelineRequest,
    ) -> Result<CreatePipelineResponse, RpcStatus>;

    async fn get_pipeline(
        &self,
        ctx: &CallContext,
        request: GetPipelineRequest,
    ) -> Result<GetPipelineResponse, RpcStatus>;

    async fn list_pipelines(
        &self,
        ctx: &CallContext,
        request: ListPipelinesRequest,
    ) -> Result<ListPipelinesResponse, RpcStatus>;

    async fn update_pipeline(
        &self,
        ctx: &CallContext,
        request: UpdatePipelineRequest,
    ) -> Result<UpdatePipelineResponse, RpcStatus>;

    async fn delete_pipeline(
        &self,
        ctx: &CallContext,
        request: DeletePipelineRequest,
    ) -> Result<DeletePipelineResponse, RpcStatus>;

    async fn start_pipeline(
        &self,
        ctx: &CallContext,
        request: StartPipelineRequest,
    ) -> Result<StartPipelineResponse, RpcStatus>;

    async fn stop_pipeline(
        &self,
        ctx: &CallContext,
        request: StopPipelineRequest,
    ) -> Result<StopPipelineResponse, RpcStatus>;
}
