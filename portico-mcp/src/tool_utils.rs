//! Tool naming, content hashing and catalog diffing

use sha2::{Digest, Sha256};
use std::collections::HashMap;

use portico_storage::entities::mcp_tools::ToolMetadata;
use portico_storage::repositories::mcp_tool_repository::ToolUpsert;

use crate::error::GatewayError;

/// Separator between the server prefix and the sanitized canonical name.
pub const TOOL_NAME_SEPARATOR: &str = "__";

/// Hash content to detect meaningful changes while ignoring formatting.
/// Strings are lowercased and stripped to `[a-z0-9]`; objects are canonical
/// JSON with sorted keys and compact separators. SHA-256 hex digest.
pub fn normalize_and_hash_content(content: &serde_json::Value) -> String {
    let normalized = match content {
        serde_json::Value::String(s) => s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect::<String>(),
        other => canonical_json(other),
    };
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// serde_json with sorted keys and no whitespace.
fn canonical_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner = keys
                .iter()
                .map(|k| format!("{}:{}", serde_json::to_string(k).unwrap(), canonical_json(&map[*k])))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", inner)
        }
        serde_json::Value::Array(items) => {
            let inner = items.iter().map(canonical_json).collect::<Vec<_>>().join(",");
            format!("[{}]", inner)
        }
        other => serde_json::to_string(other).unwrap(),
    }
}

/// Sanitize an upstream tool name into the platform alphabet: uppercase,
/// `[^A-Z0-9_]` replaced by `_`, runs of `_` collapsed, edges stripped.
/// Empty results are rejected.
pub fn sanitize_canonical_tool_name(canonical_tool_name: &str) -> Result<String, GatewayError> {
    let upper = canonical_tool_name.to_uppercase();
    let replaced: String = upper
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    let mut last_was_underscore = false;
    for c in replaced.chars() {
        if c == '_' {
            if !last_was_underscore {
                collapsed.push(c);
            }
            last_was_underscore = true;
        } else {
            collapsed.push(c);
            last_was_underscore = false;
        }
    }

    let sanitized = collapsed.trim_matches('_').to_string();
    if sanitized.is_empty() {
        return Err(GatewayError::ToolSanitization(format!(
            "tool name '{}' is empty after sanitization",
            canonical_tool_name
        )));
    }
    Ok(sanitized)
}

/// Build the platform-unique tool name.
pub fn platform_tool_name(server_name: &str, canonical_tool_name: &str) -> Result<String, GatewayError> {
    Ok(format!(
        "{}{}{}",
        server_name,
        TOOL_NAME_SEPARATOR,
        sanitize_canonical_tool_name(canonical_tool_name)?
    ))
}

/// Compute the metadata block for an upstream tool.
pub fn tool_metadata(
    canonical_name: &str,
    description: &str,
    input_schema: &serde_json::Value,
) -> ToolMetadata {
    ToolMetadata {
        canonical_tool_name: canonical_name.to_string(),
        canonical_tool_description_hash: normalize_and_hash_content(&serde_json::Value::String(
            description.to_string(),
        )),
        canonical_tool_input_schema_hash: normalize_and_hash_content(input_schema),
    }
}

/// The five-way partition of a catalog diff. Tools are matched by platform
/// name; embedding-relevant changes are detected through the stored hashes,
/// so a description reworded into the same normalized content lands in the
/// cheaper metadata-update bucket.
#[derive(Debug, Default)]
pub struct ToolDiff {
    pub to_create: Vec<ToolUpsert>,
    pub to_delete: Vec<String>,
    pub embedding_updated: Vec<ToolUpsert>,
    pub metadata_updated: Vec<ToolUpsert>,
    pub unchanged: Vec<String>,
}

fn embedding_fields_changed(old: &ToolMetadata, new: &ToolMetadata) -> bool {
    old.canonical_tool_name != new.canonical_tool_name
        || old.canonical_tool_description_hash != new.canonical_tool_description_hash
        || old.canonical_tool_input_schema_hash != new.canonical_tool_input_schema_hash
}

fn non_embedding_fields_changed(old: &ToolUpsert, new: &ToolUpsert) -> bool {
    old.description != new.description || old.input_schema != new.input_schema
}

/// Diff the stored tools of a server against a fresh upstream listing.
pub fn diff_tools(old_tools: &[ToolUpsert], new_tools: Vec<ToolUpsert>) -> ToolDiff {
    let old_by_name: HashMap<&str, &ToolUpsert> =
        old_tools.iter().map(|tool| (tool.name.as_str(), tool)).collect();
    let new_names: std::collections::HashSet<String> =
        new_tools.iter().map(|tool| tool.name.clone()).collect();

    let mut diff = ToolDiff::default();

    for tool in new_tools {
        match old_by_name.get(tool.name.as_str()) {
            None => diff.to_create.push(tool),
            Some(old_tool) => {
                if embedding_fields_changed(&old_tool.metadata, &tool.metadata) {
                    diff.embedding_updated.push(tool);
                } else if non_embedding_fields_changed(old_tool, &tool) {
                    diff.metadata_updated.push(tool);
                } else {
                    diff.unchanged.push(tool.name);
                }
            }
        }
    }

    for tool in old_tools {
        if !new_names.contains(&tool.name) {
            diff.to_delete.push(tool.name.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_maps_to_platform_alphabet() {
        assert_eq!(
            sanitize_canonical_tool_name("create-pull-request").unwrap(),
            "CREATE_PULL_REQUEST"
        );
        assert_eq!(sanitize_canonical_tool_name("get.user v2").unwrap(), "GET_USER_V2");
        assert_eq!(sanitize_canonical_tool_name("__weird___name__").unwrap(), "WEIRD_NAME");
        assert!(sanitize_canonical_tool_name("---").is_err());
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in ["create-pull-request", "list issues!", "A__B", "x9"] {
            let once = sanitize_canonical_tool_name(name).unwrap();
            let twice = sanitize_canonical_tool_name(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn sanitized_names_match_required_shape() {
        for name in ["tool.name", "a b c", "Z", "many___underscores"] {
            let sanitized = sanitize_canonical_tool_name(name).unwrap();
            assert!(!sanitized.starts_with('_') && !sanitized.ends_with('_'));
            assert!(!sanitized.contains("__"));
            assert!(sanitized
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
        }
    }

    #[test]
    fn hash_ignores_formatting_of_strings() {
        assert_eq!(
            normalize_and_hash_content(&json!("Hello, World!")),
            normalize_and_hash_content(&json!("helloworld"))
        );
        assert_ne!(
            normalize_and_hash_content(&json!("hello")),
            normalize_and_hash_content(&json!("goodbye"))
        );
    }

    #[test]
    fn hash_of_objects_is_key_order_independent() {
        let a = json!({"b": 1, "a": {"y": 2, "x": 3}});
        let b = json!({"a": {"x": 3, "y": 2}, "b": 1});
        assert_eq!(normalize_and_hash_content(&a), normalize_and_hash_content(&b));
    }

    fn upsert(name: &str, description: &str, schema: serde_json::Value) -> ToolUpsert {
        let canonical = name.to_lowercase().replace('_', "-");
        ToolUpsert {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: schema.clone(),
            metadata: tool_metadata(&canonical, description, &schema),
        }
    }

    #[test]
    fn diff_partitions_create_delete_update_unchanged() {
        let schema = json!({"type": "object"});
        let old = vec![
            upsert("GH__A", "does a", schema.clone()),
            upsert("GH__B", "old description", schema.clone()),
        ];

        let new = vec![
            upsert("GH__A", "does a", schema.clone()),
            upsert("GH__B", "new description", schema.clone()),
            upsert("GH__C", "brand new", schema),
        ];

        let diff = diff_tools(&old, new);
        assert_eq!(diff.unchanged, vec!["GH__A".to_string()]);
        assert_eq!(diff.embedding_updated.len(), 1);
        assert_eq!(diff.embedding_updated[0].name, "GH__B");
        assert_eq!(diff.to_create.len(), 1);
        assert_eq!(diff.to_create[0].name, "GH__C");
        assert!(diff.to_delete.is_empty());
        assert!(diff.metadata_updated.is_empty());
    }

    #[test]
    fn diff_detects_removed_tools() {
        let old = vec![upsert("GH__GONE", "bye", json!({}))];
        let diff = diff_tools(&old, vec![]);
        assert_eq!(diff.to_delete, vec!["GH__GONE".to_string()]);
    }

    #[test]
    fn rewording_into_same_normalized_content_is_a_metadata_update() {
        let schema = json!({"type": "object"});
        // Same normalized content ("helloworld"), different raw text
        let old = vec![upsert("GH__T", "Hello, World!", schema.clone())];
        let diff = diff_tools(&old, vec![upsert("GH__T", "hello world", schema)]);
        assert!(diff.embedding_updated.is_empty());
        assert_eq!(diff.metadata_updated.len(), 1);
    }
}
