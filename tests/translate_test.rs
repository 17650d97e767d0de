//! Integration tests for normalization, import and export.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shape_schema::{
    export_node, import_node, normalize, BoolNode, CollectingSink, DictNode, Element,
    ExportOptions, FloatNode, IntNode, ListNode, Node, StrNode, Translator, DRAFT_2020_12,
};
use std::sync::Arc;

fn bare() -> ExportOptions {
    ExportOptions::new().hide_draft_header(true)
}

fn collecting() -> (Translator, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    (Translator::with_sink(sink.clone()), sink)
}

/// Exported schemas must compile as draft 2020-12 (the default without `$schema`).
fn compiled(schema: &Value) -> jsonschema::Validator {
    jsonschema::validator_for(schema).unwrap()
}

mod round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_round_trip(node: Node) {
        let exported = export_node(&node, &bare());
        assert_eq!(import_node(&exported), node, "exported as {}", exported);
    }

    #[test]
    fn int_nodes() {
        assert_round_trip(Node::Int(IntNode::default()));
        assert_round_trip(Node::Int(IntNode::default().min(-5)));
        assert_round_trip(Node::Int(IntNode::default().min(0).max(100)));
        assert_round_trip(Node::Int(IntNode::default().value(7)));
    }

    #[test]
    fn str_nodes() {
        assert_round_trip(Node::Str(StrNode::default()));
        assert_round_trip(Node::Str(StrNode::default().len(3)));
        assert_round_trip(Node::Str(StrNode::default().min_len(1).max_len(64)));
        assert_round_trip(Node::Str(StrNode::default().pattern("^[a-z]+$")));
        assert_round_trip(Node::Str(StrNode::default().value("fixed")));
        assert_round_trip(Node::Str(StrNode::default().alphabet("01")));
        assert_round_trip(Node::Str(StrNode::default().alphabet("a.b*")));
        assert_round_trip(Node::Str(StrNode::default().substr("needle")));
        assert_round_trip(Node::Str(StrNode::default().substr("(x)")));
    }

    #[test]
    fn generated_looking_pattern_reads_back_as_alphabet() {
        let node = Node::Str(StrNode::default().pattern("^(a|b)+$"));
        assert_eq!(
            import_node(&export_node(&node, &bare())),
            Node::Str(StrNode::default().alphabet("ab"))
        );
        let node = Node::Str(StrNode::default().pattern("^.*(ab).*$"));
        assert_eq!(
            import_node(&export_node(&node, &bare())),
            Node::Str(StrNode::default().substr("ab"))
        );
    }

    #[test]
    fn list_nodes() {
        assert_round_trip(Node::List(ListNode::default()));
        assert_round_trip(Node::List(ListNode::default().len(2)));
        assert_round_trip(Node::List(
            ListNode::of(Node::Int(IntNode::default())).min_len(1).max_len(3),
        ));
        assert_round_trip(Node::List(ListNode::tuple(vec![
            Element::Node(Node::Str(StrNode::default())),
            Element::Node(Node::Null),
        ])));
        assert_round_trip(Node::List(ListNode::tuple(vec![
            Element::Node(Node::Bool(BoolNode::default())),
            Element::Ellipsis,
        ])));
    }

    #[test]
    fn float_comes_back_as_number_union() {
        let node = Node::Float(FloatNode::default().min(0.5).max(2.5));
        let back = import_node(&export_node(&node, &bare()));
        assert_eq!(
            back,
            Node::Union(vec![node, Node::Int(IntNode::default().min(1).max(2))])
        );
    }

    #[test]
    fn dict_nodes() {
        assert_round_trip(Node::Dict(
            DictNode::closed()
                .key("id", IntNode::default().min(1))
                .optional_key("name", StrNode::default().max_len(20)),
        ));
        assert_round_trip(Node::Dict(DictNode::default()));
    }

    #[test]
    fn unordered_and_union() {
        assert_round_trip(Node::Unordered(Box::new(Node::Str(
            StrNode::default().value("x"),
        ))));
        assert_round_trip(Node::Union(vec![
            Node::Str(StrNode::default()),
            Node::Null,
        ]));
    }
}

mod equal_bounds {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn int_value_exports_as_equal_bounds() {
        let node = Node::Int(IntNode::default().min(4).max(4));
        assert_eq!(
            export_node(&node, &bare()),
            json!({ "type": "integer", "minimum": 4, "maximum": 4 })
        );
        assert_eq!(
            import_node(&json!({ "type": "integer", "minimum": 4, "maximum": 4 })),
            Node::Int(IntNode::default().value(4))
        );
    }

    #[test]
    fn number_branches_collapse_independently() {
        assert_eq!(
            import_node(&json!({ "type": "number", "minimum": 2, "maximum": 2 })),
            Node::Union(vec![
                Node::Float(FloatNode::default().value(2.0)),
                Node::Int(IntNode::default().value(2)),
            ])
        );
    }
}

mod import_rules {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_one_of_is_unwrapped() {
        assert_eq!(
            import_node(&json!({ "oneOf": [{ "type": "string" }] })),
            Node::Str(StrNode::default())
        );
    }

    #[test]
    fn keys_are_optional_without_required() {
        let node = import_node(&json!({
            "type": "object",
            "properties": { "a": { "type": "integer" } }
        }));
        let Node::Dict(dict) = &node else {
            panic!("expected dict, got {}", node);
        };
        assert!(dict.allows_additional);
        assert!(dict.keys.as_ref().unwrap()["a"].optional);
    }

    #[test]
    fn tuple_with_open_tail() {
        let schema = json!({
            "type": "array",
            "prefixItems": [{ "type": "string" }, { "type": "integer" }],
            "items": true
        });
        let node = import_node(&schema);
        assert_eq!(
            node,
            Node::List(ListNode::tuple(vec![
                Element::Node(Node::Str(StrNode::default())),
                Element::Node(Node::Int(IntNode::default())),
                Element::Ellipsis,
            ]))
        );
        assert_eq!(export_node(&node, &bare()), schema);
    }

    #[test]
    fn openapi_nullable_enum() {
        assert_eq!(
            import_node(&json!({ "enum": ["on", "off", null] })),
            Node::Union(vec![
                Node::Str(StrNode::default().value("on")),
                Node::Str(StrNode::default().value("off")),
                Node::Null,
            ])
        );
    }

    #[test]
    fn unknown_type_reports_once() {
        let (translator, sink) = collecting();
        let node = translator.import(&json!({
            "type": "object",
            "properties": { "when": { "type": "datetime" } }
        }));
        assert_eq!(
            node,
            Node::Dict(DictNode::open().optional_key("when", Node::any()))
        );
        assert_eq!(sink.messages(), vec!["unknown type 'datetime', treating as any"]);
    }
}

mod export_rules {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alphabet_pattern() {
        assert_eq!(
            export_node(&Node::Str(StrNode::default().alphabet("abcd")), &bare()),
            json!({ "type": "string", "pattern": "^(a|b|c|d)+$" })
        );
    }

    #[test]
    fn draft_header_and_title_at_root_only() {
        let node = Node::Dict(DictNode::closed().key("inner", Node::Null));
        let schema = export_node(&node, &ExportOptions::new().title("Outer"));
        assert_eq!(
            schema,
            json!({
                "$schema": DRAFT_2020_12,
                "title": "Outer",
                "type": "object",
                "properties": { "inner": { "type": "null" } },
                "required": ["inner"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn unsupported_props_warn_without_changing_output() {
        let (translator, sink) = collecting();
        let node = Node::Bytes(shape_schema::BytesNode {
            value: Some(b"raw".to_vec()),
        });
        assert_eq!(translator.export(&node, &bare()), json!({}));
        let warnings = sink.messages();
        assert_eq!(warnings[0], "unsupported prop 'value' for bytes");
        assert_eq!(warnings[1], "bytes translation is not implemented");
    }

    #[test]
    fn escaped_pattern_warns() {
        let (translator, sink) = collecting();
        let schema = translator.export(&Node::Str(StrNode::default().pattern(r"^\w+$")), &bare());
        assert_eq!(schema["pattern"], r"^\w+$");
        assert_eq!(sink.messages().len(), 1);
        assert!(sink.messages()[0].starts_with(r"pattern '^\w+$' contains escape sequences"));
    }
}

mod cycles {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mutual() -> Value {
        json!({
            "components": {
                "schemas": {
                    "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
                    "B": { "type": "object", "properties": { "a": { "$ref": "#/components/schemas/A" } } }
                }
            },
            "root": { "$ref": "#/components/schemas/A" }
        })
    }

    #[test]
    fn mutual_cycle_terminates_with_one_warning() {
        let (translator, sink) = collecting();
        let normalized = translator.normalize(&mutual()).unwrap();

        assert_eq!(normalized["root"]["properties"]["b"]["properties"]["a"], json!({}));
        assert_eq!(sink.messages().len(), 1);
    }

    #[test]
    fn cyclic_branch_imports_as_any() {
        let (translator, _) = collecting();
        let normalized = translator.normalize(&mutual()).unwrap();
        let node = translator.import(&normalized["root"]);

        assert_eq!(
            node,
            Node::Dict(DictNode::open().optional_key(
                "b",
                DictNode::open().optional_key("a", Node::any())
            ))
        );
    }

    #[test]
    fn report_lists_cyclic_pointers() {
        let (translator, _) = collecting();
        let report = translator.normalize_report(&mutual()).unwrap();
        assert_eq!(report.cyclic_refs.len(), 2);
    }

    #[test]
    fn repeated_non_cyclic_ref_is_expanded_each_time() {
        let doc = json!({
            "$defs": { "Tag": { "type": "string" } },
            "type": "object",
            "properties": {
                "a": { "$ref": "#/$defs/Tag" },
                "b": { "$ref": "#/$defs/Tag" }
            }
        });
        let (translator, sink) = collecting();
        let normalized = translator.normalize(&doc).unwrap();
        assert_eq!(normalized["properties"]["a"], json!({ "type": "string" }));
        assert_eq!(normalized["properties"]["b"], json!({ "type": "string" }));
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn unresolved_ref_fails() {
        let doc = json!({ "properties": { "x": { "$ref": "#/nowhere" } } });
        assert!(normalize(&doc).is_err());
    }
}

mod compiled_schemas {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exported_dict_validates_instances() {
        let node = Node::Dict(
            DictNode::closed()
                .key("id", IntNode::default().min(1))
                .optional_key("code", StrNode::default().alphabet("AB"))
                .optional_key(
                    "pair",
                    ListNode::tuple(vec![
                        Element::Node(Node::Str(StrNode::default())),
                        Element::Node(Node::Int(IntNode::default())),
                    ]),
                ),
        );
        let validator = compiled(&export_node(&node, &bare()));

        assert!(validator.is_valid(&json!({ "id": 1, "code": "ABBA" })));
        assert!(validator.is_valid(&json!({ "id": 2, "pair": ["x", 3] })));
        assert!(!validator.is_valid(&json!({ "id": 0 })));
        assert!(!validator.is_valid(&json!({ "id": 1, "code": "ABC" })));
        assert!(!validator.is_valid(&json!({ "id": 1, "extra": true })));
        assert!(!validator.is_valid(&json!({ "id": 1, "pair": ["x", 3, 4] })));
    }

    #[test]
    fn exported_union_and_unordered_compile() {
        let node = Node::Union(vec![
            Node::Unordered(Box::new(Node::Str(StrNode::default().substr("ok")))),
            Node::Null,
        ]);
        let validator = compiled(&export_node(&node, &bare()));

        assert!(validator.is_valid(&json!(null)));
        assert!(validator.is_valid(&json!([1, "is ok"])));
        assert!(!validator.is_valid(&json!([1, 2])));
    }

    #[test]
    fn normalized_openapi_schema_round_trips_through_validator() {
        let doc = json!({
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "minLength": 1 },
                            "tag": { "type": "string", "nullable": true },
                            "age": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["name"]
                    }
                }
            }
        });
        let normalized = normalize(&doc).unwrap();
        let node = import_node(&normalized["components"]["schemas"]["Pet"]);
        let validator = compiled(&export_node(&node, &bare()));

        assert!(validator.is_valid(&json!({ "name": "Rex", "tag": null, "age": 3 })));
        assert!(!validator.is_valid(&json!({ "name": "" })));
        assert!(!validator.is_valid(&json!({ "tag": "x" })));
    }
}

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shared_translator_across_threads() {
        let (translator, sink) = collecting();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let translator = translator.clone();
                std::thread::spawn(move || {
                    let name = format!("t{}", i);
                    translator.import(&json!({ "type": name }))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_any());
        }
        assert_eq!(sink.messages().len(), 4);
    }
}
