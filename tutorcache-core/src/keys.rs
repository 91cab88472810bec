use serde::Serialize;
use serde_json::{Map, Value};

use crate::CacheError;

/// Separates the request path from its serialized parameters in a cache key.
pub const KEY_SEPARATOR: char = ':';

/// Trait for request descriptors that know their own cache key.
///
/// The key must be deterministic: two logically identical requests produce
/// the same key regardless of the declaration order of their parameters.
///
/// # Examples
///
/// ```
/// use tutorcache_core::{CacheableKey, RequestKey};
/// use serde_json::json;
///
/// let a = RequestKey::new("/tutors", Some(json!({"subject": "math", "page": 2})));
/// let b = RequestKey::new("/tutors", Some(json!({"page": 2, "subject": "math"})));
/// assert_eq!(a.to_cache_key(), b.to_cache_key());
/// assert_eq!(a.to_cache_key(), r#"/tutors:{"page":2,"subject":"math"}"#);
/// ```
pub trait CacheableKey {
    fn to_cache_key(&self) -> String;
}

/// A read request: path plus optional query/filter parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestKey {
    pub path: String,
    pub params: Option<Value>,
}

impl RequestKey {
    pub fn new(path: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }
}

impl CacheableKey for RequestKey {
    fn to_cache_key(&self) -> String {
        cache_key(&self.path, self.params.as_ref())
    }
}

impl CacheableKey for str {
    fn to_cache_key(&self) -> String {
        cache_key(self, None)
    }
}

impl CacheableKey for String {
    fn to_cache_key(&self) -> String {
        cache_key(self, None)
    }
}

/// Builds the cache key `"<path>:<json(params-or-{})>"`.
///
/// Parameters are canonicalized first, so object key order never affects the key.
pub fn cache_key(path: &str, params: Option<&Value>) -> String {
    let params = match params {
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(value) => canonicalize(value.clone()),
    };
    // Serializing a `Value` cannot fail
    format!("{path}{KEY_SEPARATOR}{params}")
}

/// Builds a cache key from any serializable parameter type.
///
/// # Errors
///
/// Returns [`CacheError::KeySerialization`] if `params` cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn cache_key_for<P: Serialize + ?Sized>(path: &str, params: &P) -> Result<String, CacheError> {
    let value = serde_json::to_value(params)?;
    Ok(cache_key(path, Some(&value)))
}

/// Recursively sorts object keys.
///
/// `serde_json::Map` is only sorted when the `preserve_order` feature is off, and
/// any crate in the dependency graph can switch it on, so keys are sorted here
/// explicitly.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Returns the path part of a cache key.
///
/// The boundary is the first separator followed by a JSON object or array. Keys
/// not produced by [`cache_key`] are returned whole.
pub fn key_path(key: &str) -> &str {
    let bytes = key.as_bytes();
    key.match_indices(KEY_SEPARATOR)
        .map(|(idx, _)| idx)
        .find(|&idx| matches!(bytes.get(idx + 1), Some(b'{') | Some(b'[')))
        .map_or(key, |idx| &key[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_empty_params_serialize_as_empty_object() {
        assert_eq!(cache_key("/tutors", None), "/tutors:{}");
        assert_eq!(cache_key("/tutors", Some(&Value::Null)), "/tutors:{}");
        assert_eq!(cache_key("tutors", Some(&json!({}))), "tutors:{}");
    }

    #[test]
    fn test_nested_objects_are_canonical() {
        let a = json!({"filter": {"z": 1, "a": [{"y": 2, "b": 3}]}, "page": 1});
        let b = json!({"page": 1, "filter": {"a": [{"b": 3, "y": 2}], "z": 1}});
        assert_eq!(cache_key("/bookings", Some(&a)), cache_key("/bookings", Some(&b)));
        assert_eq!(
            cache_key("/bookings", Some(&a)),
            r#"/bookings:{"filter":{"a":[{"b":3,"y":2}],"z":1},"page":1}"#
        );
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = json!({"ids": [1, 2]});
        let b = json!({"ids": [2, 1]});
        assert_ne!(cache_key("/users", Some(&a)), cache_key("/users", Some(&b)));
    }

    #[test]
    fn test_cache_key_for_serializable() {
        #[derive(Serialize)]
        struct Filter {
            subject: &'static str,
            page: u32,
        }

        let key = cache_key_for("/tutors", &Filter { subject: "math", page: 3 }).unwrap();
        assert_eq!(key, r#"/tutors:{"page":3,"subject":"math"}"#);
    }

    #[test]
    fn test_cache_key_for_rejects_non_string_map_keys() {
        let mut params = HashMap::new();
        params.insert(vec![1u8], 1);
        assert!(matches!(
            cache_key_for("/tutors", &params),
            Err(CacheError::KeySerialization(_))
        ));
    }

    #[test]
    fn test_key_path() {
        assert_eq!(key_path("/tutors/42:{}"), "/tutors/42");
        assert_eq!(key_path(r#"/tutors:{"page":1}"#), "/tutors");
        assert_eq!(key_path("/a:b/c:{}"), "/a:b/c");
        assert_eq!(key_path("no-separator"), "no-separator");
    }

    #[test]
    fn test_string_keys() {
        assert_eq!("/subjects".to_cache_key(), "/subjects:{}");
        assert_eq!(String::from("/subjects").to_cache_key(), "/subjects:{}");
    }
}
