//! Field schemas for untyped-to-typed conversion.
//!
//! Path captures and query parameters arrive as strings; the request
//! envelope is a JSON tree. Each bindable request message carries a static
//! [`MessageSchema`] describing its leaf fields by dotted path so the
//! binder can convert string values into the right JSON shape and reject
//! everything else with a parameter-naming error.

use serde_json::Value;

use crate::error::GatewayError;

/// Scalar kind of a bindable leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int32,
    Int64,
    Bool,
    /// Closed set of accepted symbolic names. The bound value is the
    /// matching name itself, carried as a JSON string.
    Enum(&'static [&'static str]),
}

impl FieldKind {
    /// Convert one raw string value into its typed JSON form. Failures name
    /// the offending parameter so the caller can surface it verbatim.
    pub fn parse(&self, name: &str, raw: &str) -> Result<Value, GatewayError> {
        let mismatch = |reason: String| GatewayError::TypeMismatch {
            name: name.to_string(),
            reason,
        };
        match self {
            FieldKind::String => Ok(Value::String(raw.to_string())),
            FieldKind::Int32 => raw
                .parse::<i32>()
                .map(|v| Value::Number(v.into()))
                .map_err(|e| mismatch(e.to_string())),
            FieldKind::Int64 => raw
                .parse::<i64>()
                .map(|v| Value::Number(v.into()))
                .map_err(|e| mismatch(e.to_string())),
            FieldKind::Bool => match raw {
                "true" | "True" | "TRUE" | "t" | "T" | "1" => Ok(Value::Bool(true)),
                "false" | "False" | "FALSE" | "f" | "F" | "0" => Ok(Value::Bool(false)),
                _ => Err(mismatch(format!("invalid boolean value {raw:?}"))),
            },
            FieldKind::Enum(names) => {
                if names.contains(&raw) {
                    Ok(Value::String(raw.to_string()))
                } else {
                    Err(mismatch(format!("invalid enum value {raw:?}")))
                }
            }
        }
    }
}

/// One bindable leaf field of a request message.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Dotted camelCase path from the message root, e.g. `filter.pageSize`.
    pub path: &'static str,
    pub kind: FieldKind,
    pub repeated: bool,
}

/// Static description of a request message's bindable leaf fields.
///
/// Only fields reachable from the URL (path captures and query parameters)
/// need to appear here; body fields go through serde directly.
#[derive(Debug, Clone, Copy)]
pub struct MessageSchema {
    pub fields: &'static [FieldSpec],
}

impl MessageSchema {
    pub const EMPTY: MessageSchema = MessageSchema { fields: &[] };

    /// Look up a leaf field by its canonical dotted camelCase path.
    pub fn lookup(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.path == path)
    }
}

/// Decides which query parameter keys a route ignores.
///
/// Keys naming a field already consumed by a path capture are dropped so a
/// `?id=` in the query can never fight the `{id}` in the path. Exclusion is
/// per dotted segment: excluding `pipeline` also drops `pipeline.state`,
/// but not `pipelineId`.
#[derive(Debug, Clone, Copy)]
pub struct QueryFilter {
    excluded: &'static [&'static str],
}

impl QueryFilter {
    /// A filter that admits every key.
    pub const ALL: QueryFilter = QueryFilter { excluded: &[] };

    pub const fn excluding(excluded: &'static [&'static str]) -> Self {
        Self { excluded }
    }

    /// Whether a canonical dotted field path is excluded from query binding.
    pub fn excludes(&self, path: &str) -> bool {
        self.excluded.iter().any(|prefix| {
            path == *prefix
                || (path.len() > prefix.len()
                    && path.starts_with(prefix)
                    && path.as_bytes()[prefix.len()] == b'.')
        })
    }
}

/// Canonicalize a query key into the dotted camelCase form schemas use.
/// Each dotted component is converted from snake_case independently;
/// already-camelCase keys pass through unchanged.
pub fn canonical_field_path(key: &str) -> String {
    key.split('.')
        .map(snake_to_camel)
        .collect::<Vec<_>>()
        .join(".")
}

fn snake_to_camel(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut upper_next = false;
    for ch in part.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int32_parse_rejects_overflow_and_garbage() {
        let kind = FieldKind::Int32;
        assert_eq!(kind.parse("pageSize", "25").unwrap(), Value::from(25));
        for bad in ["25.5", "abc", "4294967296", ""] {
            let err = kind.parse("pageSize", bad).unwrap_err();
            match err {
                GatewayError::TypeMismatch { name, .. } => assert_eq!(name, "pageSize"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn bool_parse_accepts_common_spellings() {
        let kind = FieldKind::Bool;
        assert_eq!(kind.parse("x", "true").unwrap(), Value::Bool(true));
        assert_eq!(kind.parse("x", "1").unwrap(), Value::Bool(true));
        assert_eq!(kind.parse("x", "False").unwrap(), Value::Bool(false));
        assert!(kind.parse("x", "yes").is_err());
    }

    #[test]
    fn enum_parse_is_closed() {
        let kind = FieldKind::Enum(&["STATE_RUNNING", "STATE_STOPPED"]);
        assert_eq!(
            kind.parse("state", "STATE_RUNNING").unwrap(),
            Value::String("STATE_RUNNING".into())
        );
        assert!(kind.parse("state", "RUNNING").is_err());
    }

    #[test]
    fn filter_excludes_at_segment_boundaries() {
        let filter = QueryFilter::excluding(&["id", "pipeline"]);
        assert!(filter.excludes("id"));
        assert!(filter.excludes("pipeline.displayName"));
        assert!(!filter.excludes("idempotencyKey"));
        assert!(!filter.excludes("pipelineId"));
        assert!(!QueryFilter::ALL.excludes("id"));
    }

    #[test]
    fn canonical_path_converts_each_component() {
        assert_eq!(canonical_field_path("page_size"), "pageSize");
        assert_eq!(
            canonical_field_path("filter.display_name_contains"),
            "filter.displayNameContains"
        );
        assert_eq!(canonical_field_path("pageToken"), "pageToken");
    }
}
