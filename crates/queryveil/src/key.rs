// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache key derivation from operation arguments.
//!
//! Two operations produce the same key exactly when they have the same key
//! prefix, read kind, and structurally equal arguments. Object keys are
//! sorted before hashing so that argument ordering never splits the cache.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::ReadKind;

/// Separator between the key prefix and the argument digest.
pub(crate) const KEY_SEPARATOR: char = '~';

/// Derives the cache key for a read operation.
///
/// The key is `<prefix>~<hex digest>` where the digest covers the read kind
/// and the canonical form of the arguments.
pub(crate) fn derive(prefix: &str, kind: ReadKind, arguments: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(&mut canonical, arguments);

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(&kind).unwrap_or_default());
    hasher.update(&canonical);
    format!("{prefix}{KEY_SEPARATOR}{}", hex::encode(hasher.finalize()))
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(key, _)| *key);

            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(out, value);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_carries_prefix_and_separator() {
        let key = derive("Post", ReadKind::FindUnique, &json!({"where": {"id": 1}}));
        assert!(key.starts_with("Post~"));
        assert_eq!(key.len(), "Post~".len() + 64);
    }

    #[test]
    fn argument_order_does_not_matter() {
        let a = derive("Post", ReadKind::FindMany, &json!({"take": 10, "where": {"id": 1}}));
        let b = derive("Post", ReadKind::FindMany, &json!({"where": {"id": 1}, "take": 10}));
        assert_eq!(a, b);
    }

    #[test]
    fn nested_object_order_does_not_matter() {
        let a = derive("Post", ReadKind::FindFirst, &json!({"where": {"a": 1, "b": 2}}));
        let b = derive("Post", ReadKind::FindFirst, &json!({"where": {"b": 2, "a": 1}}));
        assert_eq!(a, b);
    }

    #[test]
    fn different_arguments_produce_different_keys() {
        let a = derive("Post", ReadKind::FindUnique, &json!({"where": {"id": 1}}));
        let b = derive("Post", ReadKind::FindUnique, &json!({"where": {"id": 2}}));
        assert_ne!(a, b);
    }

    #[test]
    fn read_kind_is_part_of_the_key() {
        let args = json!({"where": {"id": 1}});
        let a = derive("Post", ReadKind::FindUnique, &args);
        let b = derive("Post", ReadKind::FindFirst, &args);
        assert_ne!(a, b);
    }

    #[test]
    fn array_order_matters() {
        let a = derive("Post", ReadKind::FindMany, &json!({"ids": [1, 2]}));
        let b = derive("Post", ReadKind::FindMany, &json!({"ids": [2, 1]}));
        assert_ne!(a, b);
    }
}
