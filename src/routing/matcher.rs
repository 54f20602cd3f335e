//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method (case-insensitive)
//! - Match path against a segment pattern with `{name}` placeholders
//! - Capture placeholder values for handlers that need them
//!
//! # Design Decisions
//! - Patterns are split into segments once, at compile time
//! - Placeholders are non-validating: any non-empty segment matches
//!   (a `{name:regex}` suffix is accepted but the regex is ignored)
//! - Literal segments are case-sensitive; segment counts must be equal,
//!   so `/a` and `/a/` are distinct paths
//! - Request segments are percent-decoded one by one after splitting, so an
//!   encoded `%2F` stays inside its segment
//! - No regex to guarantee O(n) matching

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) if !inner.is_empty() => {
                let name = inner.split_once(':').map_or(inner, |(name, _)| name);
                Segment::Param(name.to_string())
            }
            _ => Segment::Literal(raw.to_string()),
        }
    }
}

/// A compiled path pattern such as `/api/users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            segments: raw.split('/').map(Segment::parse).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the concrete path satisfies this pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match the concrete path, returning captured placeholder values.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = decode_segment(parts.next()?);
            match segment {
                Segment::Literal(expected) if part == expected.as_str() => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => params.0.push((name.clone(), part.into_owned())),
            }
        }

        // Request path has more segments than the pattern.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Placeholder values captured from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn decode_segment(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

/// Percent-decoded form of a request path, as reported back to clients.
pub fn decode_path(path: &str) -> String {
    decode_segment(path).into_owned()
}

/// Case-insensitive method comparison.
pub fn method_matches(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
