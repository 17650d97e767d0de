//! Reference normalization: inline every `$ref` so a document stands alone.
//!
//! References resolve against the document itself. A pointer that is already
//! being resolved further up the current path is a cycle: that occurrence is
//! replaced by `{}` (any) and reported once through the warning sink.

use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::error::TranslateError;
use crate::loader::resolve_fragment;
use crate::types::Translator;

/// Result of normalizing a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The document with every `$ref` inlined.
    pub document: Value,
    /// Pointers whose recursion was cut, in detection order.
    pub cyclic_refs: Vec<String>,
}

struct RefContext<'a> {
    root: &'a Value,
    /// Pointers currently being expanded, outermost first.
    active: Vec<String>,
    cyclic: IndexSet<String>,
}

pub(crate) fn normalize(
    document: &Value,
    translator: &Translator,
) -> Result<Normalized, TranslateError> {
    let mut ctx = RefContext {
        root: document,
        active: Vec::new(),
        cyclic: IndexSet::new(),
    };
    let normalized = resolve_value(document, &mut ctx)?;

    let cyclic_refs: Vec<String> = ctx.cyclic.into_iter().collect();
    if !cyclic_refs.is_empty() {
        translator.warn(&format!(
            "cyclic $ref in document: {}",
            cyclic_refs.join(", ")
        ));
    }

    Ok(Normalized {
        document: normalized,
        cyclic_refs,
    })
}

fn resolve_value(value: &Value, ctx: &mut RefContext<'_>) -> Result<Value, TranslateError> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(pointer)) = map.get("$ref") {
                return resolve_ref(pointer, ctx);
            }
            let mut result = Map::new();
            for (key, child) in map {
                result.insert(key.clone(), resolve_value(child, ctx)?);
            }
            Ok(Value::Object(result))
        }
        Value::Array(arr) => {
            let mut result = Vec::with_capacity(arr.len());
            for item in arr {
                result.push(resolve_value(item, ctx)?);
            }
            Ok(Value::Array(result))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_ref(pointer: &str, ctx: &mut RefContext<'_>) -> Result<Value, TranslateError> {
    if ctx.active.iter().any(|p| p == pointer) {
        tracing::debug!(pointer, depth = ctx.active.len(), "cyclic $ref cut");
        ctx.cyclic.insert(pointer.to_string());
        return Ok(Value::Object(Map::new()));
    }

    if !pointer.starts_with('#') {
        return Err(TranslateError::ExternalRef {
            pointer: pointer.to_string(),
        });
    }

    let root = ctx.root;
    let target = resolve_fragment(root, pointer).ok_or_else(|| TranslateError::UnresolvedRef {
        pointer: pointer.to_string(),
    })?;

    tracing::debug!(pointer, "resolving $ref");
    ctx.active.push(pointer.to_string());
    let resolved = resolve_value(target, ctx);
    ctx.active.pop();
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warning::CollectingSink;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn run(document: &Value) -> (Result<Normalized, TranslateError>, Vec<String>) {
        let sink = Arc::new(CollectingSink::new());
        let translator = Translator::with_sink(sink.clone());
        let result = normalize(document, &translator);
        (result, sink.messages())
    }

    #[test]
    fn inlines_simple_ref() {
        let doc = json!({
            "components": { "schemas": { "Id": { "type": "integer" } } },
            "properties": { "id": { "$ref": "#/components/schemas/Id" } }
        });
        let (result, warnings) = run(&doc);
        let normalized = result.unwrap();

        assert_eq!(
            normalized.document["properties"]["id"],
            json!({ "type": "integer" })
        );
        assert!(normalized.cyclic_refs.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn inlines_nested_refs() {
        let doc = json!({
            "$defs": {
                "Name": { "type": "string" },
                "Person": {
                    "type": "object",
                    "properties": { "name": { "$ref": "#/$defs/Name" } }
                }
            },
            "items": { "$ref": "#/$defs/Person" }
        });
        let (result, _) = run(&doc);
        let doc = result.unwrap().document;

        assert_eq!(
            doc["items"]["properties"]["name"],
            json!({ "type": "string" })
        );
    }

    #[test]
    fn refs_inside_arrays() {
        let doc = json!({
            "$defs": { "S": { "type": "string" } },
            "oneOf": [{ "$ref": "#/$defs/S" }, { "type": "null" }]
        });
        let (result, _) = run(&doc);
        assert_eq!(
            result.unwrap().document["oneOf"],
            json!([{ "type": "string" }, { "type": "null" }])
        );
    }

    #[test]
    fn self_cycle_becomes_any() {
        let doc = json!({
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/$defs/Node" } }
                }
            },
            "root": { "$ref": "#/$defs/Node" }
        });
        let (result, warnings) = run(&doc);
        let normalized = result.unwrap();

        assert_eq!(
            normalized.document["root"]["properties"]["next"],
            json!({})
        );
        assert_eq!(normalized.cyclic_refs, vec!["#/$defs/Node"]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("cyclic $ref in document"));
    }

    #[test]
    fn mutual_cycle_reports_once() {
        let doc = json!({
            "$defs": {
                "A": { "type": "object", "properties": { "b": { "$ref": "#/$defs/B" } } },
                "B": { "type": "object", "properties": { "a": { "$ref": "#/$defs/A" } } }
            },
            "root": { "$ref": "#/$defs/A" }
        });
        let (result, warnings) = run(&doc);
        let normalized = result.unwrap();

        assert_eq!(
            normalized.document["root"],
            json!({
                "type": "object",
                "properties": {
                    "b": { "type": "object", "properties": { "a": {} } }
                }
            })
        );
        assert_eq!(normalized.cyclic_refs, vec!["#/$defs/B", "#/$defs/A"]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("#/$defs/A"));
        assert!(warnings[0].contains("#/$defs/B"));
    }

    #[test]
    fn unresolved_ref_is_an_error() {
        let doc = json!({ "items": { "$ref": "#/$defs/Missing" } });
        let (result, _) = run(&doc);
        assert!(matches!(
            result,
            Err(TranslateError::UnresolvedRef { pointer }) if pointer == "#/$defs/Missing"
        ));
    }

    #[test]
    fn external_ref_is_an_error() {
        let doc = json!({ "items": { "$ref": "other.json#/Thing" } });
        let (result, _) = run(&doc);
        assert!(matches!(result, Err(TranslateError::ExternalRef { .. })));
    }

    #[test]
    fn scalars_and_order_preserved() {
        let doc = json!({ "z": 1, "a": [true, null, "x"], "m": 2.5 });
        let (result, _) = run(&doc);
        let out = result.unwrap().document;
        assert_eq!(out, doc);
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn non_string_ref_is_plain_data() {
        let doc = json!({ "properties": { "$ref": { "type": "string" } } });
        let (result, _) = run(&doc);
        assert_eq!(result.unwrap().document, doc);
    }
}
