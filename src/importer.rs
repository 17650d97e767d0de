//! JSON Schema → model import.
//!
//! Expects reference-normalized input. Composition keywords are checked
//! before `type`, each one short-circuiting the rest:
//! `allOf`, then `oneOf`/`anyOf`, then `enum`, then `type`.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::model::{
    BoolNode, DictKey, DictNode, Element, FloatNode, IntNode, ListItems, ListNode, Node, StrNode,
};
use crate::types::{json_type_name, Translator};

pub(crate) fn import_node(value: &Value, translator: &Translator) -> Node {
    Importer { translator }.import(value)
}

struct Importer<'a> {
    translator: &'a Translator,
}

impl Importer<'_> {
    fn import(&self, value: &Value) -> Node {
        let schema = match value {
            Value::Object(schema) => schema,
            Value::Bool(true) => return Node::any(),
            other => {
                self.translator.warn(&format!(
                    "expected schema object, got {}, treating as any",
                    json_type_name(other)
                ));
                return Node::any();
            }
        };

        if let Some(pointer) = schema.get("$ref") {
            self.translator.warn(&format!(
                "unresolved $ref '{}' during import, treating as any",
                pointer.as_str().unwrap_or_default()
            ));
            return Node::any();
        }

        if let Some(Value::Array(members)) = schema.get("allOf") {
            return self.import_all_of(members);
        }

        if let Some(Value::Array(members)) = schema.get("oneOf").or_else(|| schema.get("anyOf")) {
            return Node::union(members.iter().map(|m| self.import(m)).collect());
        }

        if let Some(Value::Array(literals)) = schema.get("enum") {
            return Node::union(literals.iter().map(import_literal).collect());
        }

        match schema.get("type") {
            None => match schema.get("const") {
                Some(literal) => import_literal(literal),
                None => Node::any(),
            },
            Some(Value::Array(names)) => self.import_type_list(names, schema),
            Some(Value::String(name)) => self.import_typed(name, schema),
            Some(other) => {
                self.translator.warn(&format!(
                    "invalid type keyword ({}), treating as any",
                    json_type_name(other)
                ));
                Node::any()
            }
        }
    }

    /// Dict members are merged key by key; anything else replaces the
    /// running result, so the last non-object member wins.
    fn import_all_of(&self, members: &[Value]) -> Node {
        let mut merged: Option<Node> = None;
        for member in members {
            let next = self.import(member);
            merged = Some(match (merged, next) {
                (Some(Node::Dict(acc)), Node::Dict(next)) => Node::Dict(merge_dicts(acc, next)),
                (_, next) => next,
            });
        }
        merged.unwrap_or_else(Node::any)
    }

    fn import_type_list(&self, names: &[Value], schema: &Map<String, Value>) -> Node {
        let mut variants = Vec::new();
        for name in names {
            match name.as_str() {
                Some(name) => push_flat(&mut variants, self.import_typed(name, schema)),
                None => self.translator.warn(&format!(
                    "invalid entry in type list ({}), skipped",
                    json_type_name(name)
                )),
            }
        }

        // integer and number stand in for each other
        let has_int = variants.iter().any(|v| matches!(v, Node::Int(_)));
        let has_float = variants.iter().any(|v| matches!(v, Node::Float(_)));
        if has_int && !has_float {
            variants.push(Node::Float(import_float(schema)));
        } else if has_float && !has_int {
            variants.push(Node::Int(import_int(schema)));
        }

        Node::union(variants)
    }

    fn import_typed(&self, name: &str, schema: &Map<String, Value>) -> Node {
        match name {
            "null" => Node::Null,
            "boolean" => with_nullable(schema, Node::Bool(BoolNode::default())),
            "integer" => with_nullable(schema, Node::Int(import_int(schema))),
            "number" => with_nullable(
                schema,
                Node::Union(vec![
                    Node::Float(import_float(schema)),
                    Node::Int(import_int(schema)),
                ]),
            ),
            "string" => with_nullable(schema, Node::Str(self.import_str(schema))),
            "array" => with_nullable(schema, self.import_array(schema)),
            "object" => with_nullable(schema, Node::Dict(self.import_object(schema))),
            other => {
                self.translator
                    .warn(&format!("unknown type '{}', treating as any", other));
                Node::any()
            }
        }
    }

    fn import_str(&self, schema: &Map<String, Value>) -> StrNode {
        let mut node = StrNode::default();
        (node.len, node.min_len, node.max_len) = lengths(schema, "minLength", "maxLength");

        if let Some(Value::String(value)) = schema.get("const") {
            node.value = Some(value.clone());
        }

        if let Some(Value::String(pattern)) = schema.get("pattern") {
            if let Some(alphabet) = decode_alphabet(pattern) {
                node.alphabet = Some(alphabet);
            } else if let Some(substr) = decode_substr(pattern) {
                node.substr = Some(substr);
            } else {
                node.pattern = Some(pattern.clone());
            }
        }

        if let Some(Value::String(format)) = schema.get("format") {
            if format == "binary" || format == "byte" {
                self.translator.warn(&format!(
                    "bytes translation is not implemented, format '{}' imported as str",
                    format
                ));
            }
        }

        node
    }

    fn import_array(&self, schema: &Map<String, Value>) -> Node {
        if let Some(member) = schema.get("contains") {
            return Node::Unordered(Box::new(self.import(member)));
        }

        let mut list = ListNode::default();
        (list.len, list.min_len, list.max_len) = lengths(schema, "minItems", "maxItems");

        // 2020-12 prefixItems/items, or the older items-array/additionalItems
        let tuple = match (schema.get("prefixItems"), schema.get("items")) {
            (Some(Value::Array(prefix)), tail) => Some((prefix, tail)),
            (None, Some(Value::Array(prefix))) => Some((prefix, schema.get("additionalItems"))),
            _ => None,
        };

        if let Some((prefix, tail)) = tuple {
            let mut elements: Vec<Element> = prefix
                .iter()
                .map(|e| Element::Node(self.import(e)))
                .collect();
            if !matches!(tail, Some(Value::Bool(false))) {
                elements.push(Element::Ellipsis);
            }
            list.items = Some(ListItems::Tuple(elements));
            return Node::List(list);
        }

        match schema.get("items") {
            Some(items @ Value::Object(members)) => {
                if let Some(Value::Array(variants)) = members.get("oneOf") {
                    let lists = variants
                        .iter()
                        .map(|variant| {
                            Node::List(ListNode {
                                items: Some(ListItems::Homogeneous(Box::new(
                                    self.import(variant),
                                ))),
                                ..list.clone()
                            })
                        })
                        .collect();
                    return Node::union(lists);
                }
                list.items = Some(ListItems::Homogeneous(Box::new(self.import(items))));
                Node::List(list)
            }
            _ => Node::List(list),
        }
    }

    fn import_object(&self, schema: &Map<String, Value>) -> DictNode {
        let allows_additional = !matches!(
            schema.get("additionalProperties"),
            Some(Value::Bool(false))
        );

        let Some(Value::Object(properties)) = schema.get("properties") else {
            return DictNode::default();
        };

        let required: Option<Vec<&str>> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect());

        let mut keys = IndexMap::new();
        for (name, property) in properties {
            let optional = match &required {
                Some(required) => !required.contains(&name.as_str()),
                None => true,
            };
            keys.insert(
                name.clone(),
                DictKey {
                    node: self.import(property),
                    optional,
                },
            );
        }

        DictNode {
            keys: Some(keys),
            allows_additional,
        }
    }
}

fn merge_dicts(mut acc: DictNode, next: DictNode) -> DictNode {
    if let Some(keys) = next.keys {
        let target = acc.keys.get_or_insert_with(IndexMap::new);
        for (name, key) in keys {
            target.insert(name, key);
        }
    }
    acc.allows_additional |= next.allows_additional;
    acc
}

/// Classify an `enum`/`const` literal by its JSON kind.
fn import_literal(literal: &Value) -> Node {
    match literal {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(BoolNode { value: Some(*b) }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Node::Int(IntNode::default().value(i)),
            None => Node::Float(FloatNode {
                value: n.as_f64(),
                ..FloatNode::default()
            }),
        },
        Value::String(s) => Node::Str(StrNode::default().value(s.clone())),
        Value::Array(_) => Node::List(ListNode::default()),
        Value::Object(_) => Node::Dict(DictNode::default()),
    }
}

fn is_nullable(schema: &Map<String, Value>) -> bool {
    matches!(schema.get("nullable"), Some(Value::Bool(true)))
}

fn with_nullable(schema: &Map<String, Value>, node: Node) -> Node {
    if !is_nullable(schema) {
        return node;
    }
    match node {
        Node::Union(mut variants) if !variants.is_empty() => {
            variants.push(Node::Null);
            Node::Union(variants)
        }
        other => Node::Union(vec![other, Node::Null]),
    }
}

/// Splice nested unions into `variants`, skipping structural duplicates.
fn push_flat(variants: &mut Vec<Node>, node: Node) {
    match node {
        Node::Union(inner) if !inner.is_empty() => {
            for variant in inner {
                push_flat(variants, variant);
            }
        }
        other => {
            if !variants.contains(&other) {
                variants.push(other);
            }
        }
    }
}

/// Equal bounds collapse to an exact length.
fn lengths(
    schema: &Map<String, Value>,
    min_key: &str,
    max_key: &str,
) -> (Option<u64>, Option<u64>, Option<u64>) {
    let min = schema.get(min_key).and_then(Value::as_u64);
    let max = schema.get(max_key).and_then(Value::as_u64);
    match (min, max) {
        (Some(lo), Some(hi)) if lo == hi => (Some(lo), None, None),
        _ => (None, min, max),
    }
}

/// Smallest integer admitted by a lower bound.
fn int_lower(value: &Value, exclusive: bool) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(if exclusive { n.saturating_add(1) } else { n });
    }
    let f = value.as_f64()?;
    Some(if exclusive {
        (f.floor() as i64).saturating_add(1)
    } else {
        f.ceil() as i64
    })
}

/// Largest integer admitted by an upper bound.
fn int_upper(value: &Value, exclusive: bool) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(if exclusive { n.saturating_sub(1) } else { n });
    }
    let f = value.as_f64()?;
    Some(if exclusive {
        (f.ceil() as i64).saturating_sub(1)
    } else {
        f.floor() as i64
    })
}

/// Bounds round inward, so a range holding no integer yields `min > max`.
fn import_int(schema: &Map<String, Value>) -> IntNode {
    let min = match schema.get("exclusiveMinimum") {
        // OpenAPI 3.0: boolean modifier on `minimum`
        Some(Value::Bool(exclusive)) => schema
            .get("minimum")
            .and_then(|bound| int_lower(bound, *exclusive)),
        Some(bound) => int_lower(bound, true),
        None => schema.get("minimum").and_then(|bound| int_lower(bound, false)),
    };
    let max = match schema.get("exclusiveMaximum") {
        Some(Value::Bool(exclusive)) => schema
            .get("maximum")
            .and_then(|bound| int_upper(bound, *exclusive)),
        Some(bound) => int_upper(bound, true),
        None => schema.get("maximum").and_then(|bound| int_upper(bound, false)),
    };

    match (min, max) {
        (Some(lo), Some(hi)) if lo == hi => IntNode::default().value(lo),
        _ => IntNode {
            value: None,
            min,
            max,
        },
    }
}

/// Exclusive bounds stay as inclusive ones: the model has no exclusivity flag.
fn import_float(schema: &Map<String, Value>) -> FloatNode {
    let bound = |key: &str| schema.get(key).and_then(Value::as_f64);
    let min = bound("exclusiveMinimum").or_else(|| bound("minimum"));
    let max = bound("exclusiveMaximum").or_else(|| bound("maximum"));

    match (min, max) {
        (Some(lo), Some(hi)) if lo == hi => FloatNode::default().value(lo),
        _ => FloatNode {
            value: None,
            min,
            max,
        },
    }
}

/// Recognise `^(c1|c2|...)+$` where every alternative is one escaped character.
fn decode_alphabet(pattern: &str) -> Option<String> {
    let inner = pattern.strip_prefix("^(")?.strip_suffix(")+$")?;
    let mut alphabet = String::new();
    let mut chars = inner.chars();
    loop {
        match chars.next()? {
            '\\' => alphabet.push(chars.next()?),
            '|' | '(' | ')' => return None,
            c => alphabet.push(c),
        }
        match chars.next() {
            None => break,
            Some('|') => {}
            Some(_) => return None,
        }
    }
    // the alternatives must read back exactly as they would be written
    let written: Vec<String> = alphabet
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    (written.join("|") == inner).then_some(alphabet)
}

/// Recognise `^.*(escaped).*$`.
fn decode_substr(pattern: &str) -> Option<String> {
    let inner = pattern.strip_prefix("^.*(")?.strip_suffix(").*$")?;
    let mut substr = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            substr.push(chars.next()?);
        } else {
            substr.push(c);
        }
    }
    (!substr.is_empty() && regex::escape(&substr) == inner).then_some(substr)
}
