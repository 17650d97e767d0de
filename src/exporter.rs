//! Model → JSON Schema (draft 2020-12) export.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Number, Value};

use crate::model::{
    BoolNode, DictNode, Element, FloatNode, IntNode, ListItems, ListNode, Node, StrNode,
};
use crate::types::{ExportOptions, Translator, DRAFT_2020_12};

/// Escapes like `\d` or `\w` that not every regex engine reading the
/// exported schema understands.
static WORD_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\w").expect("valid regex"));

/// Export `node` as a root document: `$schema` first, then `title`.
pub(crate) fn export_document(
    node: &Node,
    options: &ExportOptions,
    translator: &Translator,
) -> Value {
    let mut document = Map::new();
    if !options.hide_draft_header {
        document.insert("$schema".into(), Value::String(DRAFT_2020_12.into()));
    }
    if let Some(title) = &options.title {
        document.insert("title".into(), Value::String(title.clone()));
    }

    let exporter = Exporter { translator };
    if let Value::Object(body) = exporter.export(node) {
        document.extend(body);
    }
    Value::Object(document)
}

struct Exporter<'a> {
    translator: &'a Translator,
}

impl Exporter<'_> {
    fn export(&self, node: &Node) -> Value {
        self.check_props(node);
        match node {
            Node::Null => json!({ "type": "null" }),
            Node::Bool(b) => export_bool(b),
            Node::Int(i) => export_int(i),
            Node::Float(f) => self.export_float(f),
            Node::Str(s) => self.export_str(s),
            Node::List(l) => self.export_list(l),
            Node::Dict(d) => self.export_dict(d),
            Node::Union(variants) => match variants.as_slice() {
                [only] => self.export(only),
                _ => json!({ "anyOf": variants.iter().map(|v| self.export(v)).collect::<Vec<_>>() }),
            },
            Node::Unordered(member) => json!({ "type": "array", "contains": self.export(member) }),
            Node::Bytes(_) => {
                self.translator.warn("bytes translation is not implemented");
                json!({})
            }
        }
    }

    fn check_props(&self, node: &Node) {
        let supported = node.supported_props();
        for prop in node.props() {
            if !supported.contains(&prop) {
                self.translator.warn(&format!(
                    "unsupported prop '{}' for {}",
                    prop,
                    node.kind()
                ));
            }
        }
    }

    fn export_float(&self, node: &FloatNode) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), "number".into());
        let mut bound = |key: &str, value: Option<f64>| {
            let Some(value) = value else { return };
            match Number::from_f64(value) {
                Some(n) => {
                    schema.insert(key.into(), Value::Number(n));
                }
                None => self.translator.warn(&format!(
                    "non-finite float {} cannot be represented in JSON schema",
                    value
                )),
            }
        };
        match node.value {
            Some(value) => {
                bound("minimum", Some(value));
                bound("maximum", Some(value));
            }
            None => {
                bound("minimum", node.min);
                bound("maximum", node.max);
            }
        }
        Value::Object(schema)
    }

    fn export_str(&self, node: &StrNode) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), "string".into());

        if let Some(value) = &node.value {
            schema.insert("const".into(), Value::String(value.clone()));
        }

        // substr wins over alphabet, alphabet over a raw pattern
        if let Some(substr) = &node.substr {
            schema.insert(
                "pattern".into(),
                Value::String(format!("^.*({}).*$", regex::escape(substr))),
            );
        } else if let Some(alphabet) = &node.alphabet {
            let alternatives: Vec<String> = alphabet
                .chars()
                .map(|c| regex::escape(&c.to_string()))
                .collect();
            schema.insert(
                "pattern".into(),
                Value::String(format!("^({})+$", alternatives.join("|"))),
            );
        } else if let Some(pattern) = &node.pattern {
            if WORD_ESCAPE.is_match(pattern) {
                self.translator.warn(&format!(
                    "pattern '{}' contains escape sequences; not every JSON schema regex dialect supports them",
                    pattern
                ));
            }
            schema.insert("pattern".into(), Value::String(pattern.clone()));
        }

        insert_lengths(
            &mut schema,
            ("minLength", "maxLength"),
            node.len,
            node.min_len,
            node.max_len,
        );
        Value::Object(schema)
    }

    fn export_list(&self, node: &ListNode) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), "array".into());

        match &node.items {
            None => {}
            Some(ListItems::Homogeneous(element)) => {
                schema.insert("items".into(), self.export(element));
            }
            Some(ListItems::Tuple(elements)) => {
                let mut open = false;
                let mut prefix = Vec::new();
                for element in elements {
                    match element {
                        Element::Node(n) => prefix.push(self.export(n)),
                        Element::Ellipsis => open = true,
                    }
                }
                schema.insert("prefixItems".into(), Value::Array(prefix));
                schema.insert("items".into(), Value::Bool(open));
            }
        }

        insert_lengths(
            &mut schema,
            ("minItems", "maxItems"),
            node.len,
            node.min_len,
            node.max_len,
        );
        Value::Object(schema)
    }

    fn export_dict(&self, node: &DictNode) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), "object".into());

        let Some(keys) = &node.keys else {
            return Value::Object(schema);
        };

        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, key) in keys {
            properties.insert(name.clone(), self.export(&key.node));
            if !key.optional {
                required.push(Value::String(name.clone()));
            }
        }

        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        schema.insert(
            "additionalProperties".into(),
            Value::Bool(node.allows_additional),
        );
        Value::Object(schema)
    }
}

fn export_bool(node: &BoolNode) -> Value {
    match node.value {
        Some(value) => json!({ "enum": [value] }),
        None => json!({ "type": "boolean" }),
    }
}

fn export_int(node: &IntNode) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), "integer".into());
    let (min, max) = match node.value {
        Some(value) => (Some(value), Some(value)),
        None => (node.min, node.max),
    };
    if let Some(min) = min {
        schema.insert("minimum".into(), min.into());
    }
    if let Some(max) = max {
        schema.insert("maximum".into(), max.into());
    }
    Value::Object(schema)
}

/// An exact length writes both bounds.
fn insert_lengths(
    schema: &mut Map<String, Value>,
    (min_key, max_key): (&str, &str),
    len: Option<u64>,
    min_len: Option<u64>,
    max_len: Option<u64>,
) {
    let (min, max) = match len {
        Some(len) => (Some(len), Some(len)),
        None => (min_len, max_len),
    };
    if let Some(min) = min {
        schema.insert(min_key.into(), min.into());
    }
    if let Some(max) = max {
        schema.insert(max_key.into(), max.into());
    }
}
