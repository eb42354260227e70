//! Compiled path patterns: literal segments, named captures, and an
//! optional trailing multi-segment capture.
//!
//! Templates use the `/v1alpha2/redpanda-connect/pipelines/{id}/start`
//! syntax; a trailing `{name...}` capture absorbs every remaining segment
//! (joined with `/`). Compilation validates the template up front so
//! malformed patterns fail at route registration, never at request time.
//! Matching is purely structural: percent-decoded segments are compared
//! against literals, captures bind the decoded value, and any deviation in
//! segment count (absent a trailing wildcard) is a non-match the caller
//! treats as route-not-found.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// One segment matcher in a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Exact string match against the decoded path segment.
    Literal(String),
    /// Bind a single decoded segment under this name.
    Capture(String),
    /// Bind all remaining decoded segments under this name, joined
    /// with `/`. Only valid in the trailing position.
    Wildcard(String),
}

/// Errors detected while compiling a pattern template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// The template is empty or contains an empty segment (`//`).
    #[error("empty segment in pattern {template:?}")]
    EmptySegment { template: String },

    /// A `{`/`}` pair is unbalanced or the capture name is empty.
    #[error("malformed capture {segment:?} in pattern {template:?}")]
    MalformedCapture { template: String, segment: String },

    /// Two captures share the same name.
    #[error("duplicate capture name {name:?} in pattern {template:?}")]
    DuplicateCapture { template: String, name: String },

    /// A `{name...}` capture appears before the final segment.
    #[error("wildcard capture {name:?} must be the trailing segment in pattern {template:?}")]
    WildcardNotTrailing { template: String, name: String },
}

/// A compiled, immutable path pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a template into a pattern, validating capture names and
    /// wildcard placement.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let trimmed = template.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(PatternError::EmptySegment {
                template: template.to_string(),
            });
        }

        let mut segments = Vec::new();
        let mut seen = Vec::new();
        let raw: Vec<&str> = trimmed.split('/').collect();
        let last = raw.len() - 1;

        for (idx, part) in raw.iter().enumerate() {
            if part.is_empty() {
                return Err(PatternError::EmptySegment {
                    template: template.to_string(),
                });
            }
            let segment = if part.starts_with('{') || part.ends_with('}') {
                let inner = part
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .filter(|s| !s.is_empty() && !s.contains(['{', '}']))
                    .ok_or_else(|| PatternError::MalformedCapture {
                        template: template.to_string(),
                        segment: part.to_string(),
                    })?;
                let (name, wildcard) = match inner.strip_suffix("...") {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if name.is_empty() {
                    return Err(PatternError::MalformedCapture {
                        template: template.to_string(),
                        segment: part.to_string(),
                    });
                }
                if seen.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateCapture {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name.to_string());
                if wildcard {
                    if idx != last {
                        return Err(PatternError::WildcardNotTrailing {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    Segment::Wildcard(name.to_string())
                } else {
                    Segment::Capture(name.to_string())
                }
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The original template string, kept for context annotation.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of all captures (single-segment and wildcard) in order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) | Segment::Wildcard(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Test a request path against the pattern, returning bound parameter
    /// values on a match. `None` means route-not-found, never an error.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        let mut params = HashMap::new();
        let mut given = trimmed.split('/');

        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    let decoded = decode_segment(given.next()?)?;
                    if decoded != *lit {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    let decoded = decode_segment(given.next()?)?;
                    params.insert(name.clone(), decoded);
                }
                Segment::Wildcard(name) => {
                    debug_assert_eq!(idx, self.segments.len() - 1);
                    let mut rest = Vec::new();
                    for part in given.by_ref() {
                        rest.push(decode_segment(part)?);
                    }
                    if rest.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
            }
        }

        // Exact segment count required when no trailing wildcard.
        if given.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Percent-decode one path segment; invalid UTF-8 after decoding is a
/// non-match.
fn decode_segment(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}
