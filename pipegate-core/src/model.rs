//! Pipeline service data model.
//!
//! Request and response messages for the pipeline lifecycle API. JSON
//! field names are camelCase and every field is optional on the wire, so
//! partial bodies deserialize into defaults and the binder can overlay
//! path and query values afterward.

use serde::{Deserialize, Serialize};

use crate::fields::{FieldKind, FieldSpec, MessageSchema};

/// Lifecycle state of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STATE_STARTING")]
    Starting,
    #[serde(rename = "STATE_RUNNING")]
    Running,
    #[serde(rename = "STATE_STOPPING")]
    Stopping,
    #[serde(rename = "STATE_STOPPED")]
    Stopped,
    #[serde(rename = "STATE_ERROR")]
    Error,
    #[serde(rename = "STATE_COMPLETED")]
    Completed,
}

impl PipelineState {
    /// Wire names, in declaration order. Used for query-parameter binding.
    pub const NAMES: &'static [&'static str] = &[
        "STATE_UNSPECIFIED",
        "STATE_STARTING",
        "STATE_RUNNING",
        "STATE_STOPPING",
        "STATE_STOPPED",
        "STATE_ERROR",
        "STATE_COMPLETED",
    ];
}

/// Compute resources granted to a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineResources {
    pub memory_shares: String,
    pub cpu_shares: String,
}

/// Last observed error of a pipeline, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineStatus {
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pipeline {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub config_yaml: String,
    pub resources: PipelineResources,
    pub state: PipelineState,
    pub status: PipelineStatus,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePipelineRequest {
    pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePipelineResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetPipelineRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetPipelineResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
}

/// Server-side filter applied while listing pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListPipelinesFilter {
    pub display_name_contains: String,
    pub states: Vec<PipelineState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListPipelinesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<ListPipelinesFilter>,
    pub page_size: i32,
    pub page_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListPipelinesResponse {
    pub pipelines: Vec<Pipeline>,
    pub next_page_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePipelineRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
    /// Comma-separated field paths restricting which fields the update
    /// touches. Empty means full replacement.
    pub update_mask: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePipelineResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeletePipelineRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletePipelineResponse {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartPipelineRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartPipelineResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StopPipelineRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StopPipelineResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
}

// URL-bindable leaf fields per request type. Only fields a path capture
// or query parameter may set appear here; body fields go through serde.
// Server-maintained pipeline fields (`state`, `status`, `url`) are absent
// on purpose.

const ID_FIELD: FieldSpec = FieldSpec {
    path: "id",
    kind: FieldKind::String,
    repeated: false,
};

const PIPELINE_LEAVES: [FieldSpec; 6] = [
    FieldSpec {
        path: "pipeline.id",
        kind: FieldKind::String,
        repeated: false,
    },
    FieldSpec {
        path: "pipeline.displayName",
        kind: FieldKind::String,
        repeated: false,
    },
    FieldSpec {
        path: "pipeline.description",
        kind: FieldKind::String,
        repeated: false,
    },
    FieldSpec {
        path: "pipeline.configYaml",
        kind: FieldKind::String,
        repeated: false,
    },
    FieldSpec {
        path: "pipeline.resources.memoryShares",
        kind: FieldKind::String,
        repeated: false,
    },
    FieldSpec {
        path: "pipeline.resources.cpuShares",
        kind: FieldKind::String,
        repeated: false,
    },
];

const ID_ONLY_FIELDS: [FieldSpec; 1] = [ID_FIELD];

const LIST_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        path: "filter.displayNameContains",
        kind: FieldKind::String,
        repeated: false,
    },
    FieldSpec {
        path: "filter.states",
        kind: FieldKind::Enum(PipelineState::NAMES),
        repeated: true,
    },
    FieldSpec {
        path: "pageSize",
        kind: FieldKind::Int32,
        repeated: false,
    },
    FieldSpec {
        path: "pageToken",
        kind: FieldKind::String,
        repeated: false,
    },
];

const UPDATE_FIELDS: [FieldSpec; 8] = [
    ID_FIELD,
    FieldSpec {
        path: "updateMask",
        kind: FieldKind::String,
        repeated: false,
    },
    PIPELINE_LEAVES[0],
    PIPELINE_LEAVES[1],
    PIPELINE_LEAVES[2],
    PIPELINE_LEAVES[3],
    PIPELINE_LEAVES[4],
    PIPELINE_LEAVES[5],
];

impl CreatePipelineRequest {
    pub const SCHEMA: MessageSchema = MessageSchema {
        fields: &PIPELINE_LEAVES,
    };
}

impl GetPipelineRequest {
    pub const SCHEMA: MessageSchema = MessageSchema {
        fields: &ID_ONLY_FIELDS,
    };
}

impl ListPipelinesRequest {
    pub const SCHEMA: MessageSchema = MessageSchema {
        fields: &LIST_FIELDS,
    };
}

impl UpdatePipelineRequest {
    pub const SCHEMA: MessageSchema = MessageSchema {
        fields: &UPDATE_FIELDS,
    };
}

impl DeletePipelineRequest {
    pub const SCHEMA: MessageSchema = MessageSchema {
        fields: &ID_ONLY_FIELDS,
    };
}

impl StartPipelineRequest {
    pub const SCHEMA: MessageSchema = MessageSchema {
        fields: &ID_ONLY_FIELDS,
    };
}

impl StopPipelineRequest {
    pub const SCHEMA: MessageSchema = MessageSchema {
        fields: &ID_ONLY_FIELDS,
    };
}
