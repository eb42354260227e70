//! Request binding: body, then path captures, then query parameters.
//!
//! The binder assembles one JSON envelope per request. Steps run in a
//! fixed order with fixed precedence:
//!
//! 1. the decoded body lands under the route's body selector,
//! 2. path captures overwrite whatever the body put at the same leaf,
//! 3. query parameters fill leaves that are still unset.
//!
//! Query binding is lenient about keys (unknown and excluded keys are
//! dropped silently) and strict about values (a value that fails its
//! field's conversion aborts the request).

use std::collections::{HashMap, HashSet};

use pipegate_core::fields::canonical_field_path;
use pipegate_core::{Codec, GatewayError};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::routes::Route;

/// Bind one request into the route's JSON envelope.
///
/// `body` is the already-collected request body, `path_params` the values
/// the route's pattern captured, `query` the raw query string if any.
pub fn bind(
    route: &Route,
    codec: &dyn Codec,
    body: &[u8],
    path_params: &HashMap<String, String>,
    query: Option<&str>,
) -> Result<Value, GatewayError> {
    let mut envelope = Value::Object(Map::new());

    if let Some(selector) = route.body {
        bind_body(&mut envelope, selector, codec, body)?;
    }
    bind_path(&mut envelope, route, path_params)?;
    if let Some(query) = query {
        bind_query(&mut envelope, route, query)?;
    }

    Ok(envelope)
}

/// Decode the body under its selector. An empty (or whitespace-only)
/// body binds nothing, so the request falls back to defaults; `*` roots
/// the body at the message itself.
fn bind_body(
    envelope: &mut Value,
    selector: &str,
    codec: &dyn Codec,
    body: &[u8],
) -> Result<(), GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let decoded = codec.decode(body)?;
    if selector == "*" {
        match decoded {
            Value::Object(_) => *envelope = decoded,
            other => {
                return Err(GatewayError::MalformedBody {
                    reason: format!("expected a JSON object, got {}", json_kind(&other)),
                })
            }
        }
    } else {
        set_leaf(envelope, selector, decoded);
    }
    Ok(())
}

fn bind_path(
    envelope: &mut Value,
    route: &Route,
    path_params: &HashMap<String, String>,
) -> Result<(), GatewayError> {
    for name in route.path_fields {
        let raw = path_params
            .get(*name)
            .ok_or_else(|| GatewayError::MissingParameter {
                name: (*name).to_string(),
            })?;
        let field = route
            .schema
            .lookup(name)
            .ok_or_else(|| GatewayError::MissingParameter {
                name: (*name).to_string(),
            })?;
        let value = field.kind.parse(name, raw)?;
        // Path wins over body outright.
        set_leaf(envelope, name, value);
    }
    Ok(())
}

fn bind_query(envelope: &mut Value, route: &Route, query: &str) -> Result<(), GatewayError> {
    // Leaves this query string has already bound. Needed to tell "body set
    // this leaf, leave it alone" apart from "keep appending repeated
    // values" and "first scalar value wins".
    let mut bound: HashSet<String> = HashSet::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let canonical = canonical_field_path(&key);
        if route.filter.excludes(&canonical) {
            continue;
        }
        let Some(field) = route.schema.lookup(&canonical) else {
            continue;
        };
        if !bound.contains(&canonical) && leaf_present(envelope, &canonical) {
            continue;
        }
        let parsed = field.kind.parse(&key, &value)?;
        let first = bound.insert(canonical.clone());
        if field.repeated {
            push_leaf(envelope, &canonical, parsed);
        } else if first {
            set_leaf(envelope, &canonical, parsed);
        }
    }
    Ok(())
}

/// Set a dotted leaf, creating intermediate objects and replacing
/// non-object intermediates on the way.
fn set_leaf(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let map = node.as_object_mut().unwrap();
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return;
        }
        node = map.entry(part.to_string()).or_insert(Value::Object(Map::new()));
    }
}

/// Append to a repeated dotted leaf, creating the array if absent.
fn push_leaf(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let map = node.as_object_mut().unwrap();
        if parts.peek().is_none() {
            let slot = map.entry(part.to_string()).or_insert(Value::Array(Vec::new()));
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            slot.as_array_mut().unwrap().push(value);
            return;
        }
        node = map.entry(part.to_string()).or_insert(Value::Object(Map::new()));
    }
}

/// Whether a dotted leaf holds a non-null value.
fn leaf_present(root: &Value, path: &str) -> bool {
    let mut node = root;
    for part in path.split('.') {
        match node.get(part) {
            Some(next) => node = next,
            None => return false,
        }
    }
    !node.is_null()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
