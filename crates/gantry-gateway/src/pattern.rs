//! Path templates and parameter extraction.
//!
//! Templates use `{name}` for a single path segment, for example
//! `/v1/users/{user_id}/posts/{post_id}`. Empty segments are ignored on both
//! sides, so `/v1/users/` and `/v1/users` are the same path.

use std::collections::HashMap;

use crate::error::{GatewayError, GatewayResult};

/// Parameters captured from the request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidPattern` if the template does not start
    /// with `/`, has an empty, unclosed or duplicated parameter, or contains
    /// a brace inside a literal segment.
    pub fn parse(pattern: &str) -> GatewayResult<Self> {
        if !pattern.starts_with('/') {
            return Err(GatewayError::invalid_pattern(pattern, "must start with '/'"));
        }

        let mut segments = Vec::new();
        for raw in pattern.split('/').filter(|s| !s.is_empty()) {
            let segment = if let Some(inner) = raw.strip_prefix('{') {
                let name = inner.strip_suffix('}').ok_or_else(|| {
                    GatewayError::invalid_pattern(pattern, format!("unclosed parameter '{raw}'"))
                })?;
                if name.is_empty() {
                    return Err(GatewayError::invalid_pattern(pattern, "empty parameter name"));
                }
                if !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
                {
                    return Err(GatewayError::invalid_pattern(
                        pattern,
                        format!("invalid parameter name '{name}'"),
                    ));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                {
                    return Err(GatewayError::invalid_pattern(
                        pattern,
                        format!("duplicate parameter '{name}'"),
                    ));
                }
                Segment::Param(name.to_string())
            } else {
                if raw.contains('{') || raw.contains('}') {
                    return Err(GatewayError::invalid_pattern(
                        pattern,
                        format!("unexpected brace in segment '{raw}'"),
                    ));
                }
                Segment::Literal(raw.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Returns the template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a request path, returning the captured parameters.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                Segment::Literal(expected) if expected != value => return None,
                Segment::Literal(_) => {}
                Segment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }

        Some(PathParams { params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = PathPattern::parse("/v1/health").unwrap();
        assert!(pattern.match_path("/v1/health").unwrap().is_empty());
        assert!(pattern.match_path("/v1/health/").is_some());
        assert!(pattern.match_path("/v1/status").is_none());
    }

    #[test]
    fn test_param_capture() {
        let pattern = PathPattern::parse("/v1/users/{user_id}/posts/{post_id}").unwrap();

        let params = pattern.match_path("/v1/users/42/posts/99").unwrap();
        assert_eq!(params.get("user_id"), Some("42"));
        assert_eq!(params.get("post_id"), Some("99"));
        assert_eq!(params.len(), 2);

        let names: Vec<_> = pattern.param_names().collect();
        assert_eq!(names, vec!["user_id", "post_id"]);
    }

    #[test]
    fn test_segment_count_mismatch() {
        let pattern = PathPattern::parse("/users/{id}").unwrap();
        assert!(pattern.match_path("/users").is_none());
        assert!(pattern.match_path("/users/1/extra").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.match_path("/").is_some());
        assert!(pattern.match_path("/x").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in [
            "users",
            "/users/{",
            "/users/{}",
            "/users/{id}/{id}",
            "/users/x{id}",
            "/users/{id-x}",
        ] {
            assert!(
                matches!(PathPattern::parse(bad), Err(GatewayError::InvalidPattern { .. })),
                "pattern {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_as_str() {
        let pattern = PathPattern::parse("/v1/items/{id}").unwrap();
        assert_eq!(pattern.as_str(), "/v1/items/{id}");
    }
}
