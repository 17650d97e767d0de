//! Structural schema model.
//!
//! A closed set of node kinds describing data shapes independently of any
//! wire format. Nodes are plain values: equality is structural and nothing
//! is mutated once a node is built.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A schema model node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Exactly JSON `null`.
    Null,
    Bool(BoolNode),
    Int(IntNode),
    Float(FloatNode),
    Str(StrNode),
    List(ListNode),
    Dict(DictNode),
    /// Any of the variants. An empty variant list accepts anything.
    Union(Vec<Node>),
    /// A sequence holding at least one element of this shape, at any position.
    Unordered(Box<Node>),
    Bytes(BytesNode),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
}

/// Integer node. A set `value` stands for `min == max == value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// String node.
///
/// `alphabet` and `substr` are alternative spellings of a pattern and are
/// never combined with `pattern` on one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alphabet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ListItems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<u64>,
}

/// Element description of a list: homogeneous or tuple-shaped, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListItems {
    Homogeneous(Box<Node>),
    Tuple(Vec<Element>),
}

/// One position of a tuple-shaped list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Node(Node),
    /// Zero or more further elements of any shape.
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictNode {
    /// Declared keys in declaration order. `None` means any object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<IndexMap<String, DictKey>>,
    #[serde(default = "default_true")]
    pub allows_additional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictKey {
    pub node: Node,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BytesNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<u8>>,
}

fn default_true() -> bool {
    true
}

impl Default for DictNode {
    fn default() -> Self {
        Self {
            keys: None,
            allows_additional: true,
        }
    }
}

/// Properties each node kind knows how to export.
pub mod supported {
    pub const NULL: &[&str] = &[];
    pub const BOOL: &[&str] = &["value"];
    pub const INT: &[&str] = &["value", "min", "max"];
    pub const FLOAT: &[&str] = &["value", "min", "max"];
    pub const STR: &[&str] = &[
        "value", "pattern", "len", "min_len", "max_len", "alphabet", "substr",
    ];
    pub const LIST: &[&str] = &["len", "min_len", "max_len", "type", "elements"];
    pub const DICT: &[&str] = &["keys"];
    pub const UNION: &[&str] = &["types"];
    pub const UNORDERED: &[&str] = &["type"];
    pub const BYTES: &[&str] = &[];
}

impl Node {
    /// The unconstrained node: an empty union.
    pub fn any() -> Self {
        Node::Union(Vec::new())
    }

    /// Build a union, unwrapping it when there is exactly one variant.
    pub fn union(mut variants: Vec<Node>) -> Self {
        if variants.len() == 1 {
            variants.remove(0)
        } else {
            Node::Union(variants)
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Node::Union(variants) if variants.is_empty())
    }

    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Int(_) => "int",
            Node::Float(_) => "float",
            Node::Str(_) => "str",
            Node::List(_) => "list",
            Node::Dict(_) => "dict",
            Node::Union(_) => "any",
            Node::Unordered(_) => "unordered",
            Node::Bytes(_) => "bytes",
        }
    }

    /// Names of the properties set on this node.
    pub fn props(&self) -> Vec<&'static str> {
        let mut props = Vec::new();
        let mut mark = |set: bool, name: &'static str| {
            if set {
                props.push(name);
            }
        };
        match self {
            Node::Null => {}
            Node::Bool(b) => mark(b.value.is_some(), "value"),
            Node::Int(i) => {
                mark(i.value.is_some(), "value");
                mark(i.min.is_some(), "min");
                mark(i.max.is_some(), "max");
            }
            Node::Float(f) => {
                mark(f.value.is_some(), "value");
                mark(f.min.is_some(), "min");
                mark(f.max.is_some(), "max");
            }
            Node::Str(s) => {
                mark(s.value.is_some(), "value");
                mark(s.pattern.is_some(), "pattern");
                mark(s.len.is_some(), "len");
                mark(s.min_len.is_some(), "min_len");
                mark(s.max_len.is_some(), "max_len");
                mark(s.alphabet.is_some(), "alphabet");
                mark(s.substr.is_some(), "substr");
            }
            Node::List(l) => {
                mark(l.len.is_some(), "len");
                mark(l.min_len.is_some(), "min_len");
                mark(l.max_len.is_some(), "max_len");
                mark(
                    matches!(l.items, Some(ListItems::Homogeneous(_))),
                    "type",
                );
                mark(matches!(l.items, Some(ListItems::Tuple(_))), "elements");
            }
            Node::Dict(d) => mark(d.keys.is_some(), "keys"),
            Node::Union(variants) => mark(!variants.is_empty(), "types"),
            Node::Unordered(_) => mark(true, "type"),
            Node::Bytes(b) => mark(b.value.is_some(), "value"),
        }
        props
    }

    /// Properties the exporter renders for this node's kind.
    pub fn supported_props(&self) -> &'static [&'static str] {
        match self {
            Node::Null => supported::NULL,
            Node::Bool(_) => supported::BOOL,
            Node::Int(_) => supported::INT,
            Node::Float(_) => supported::FLOAT,
            Node::Str(_) => supported::STR,
            Node::List(_) => supported::LIST,
            Node::Dict(_) => supported::DICT,
            Node::Union(_) => supported::UNION,
            Node::Unordered(_) => supported::UNORDERED,
            Node::Bytes(_) => supported::BYTES,
        }
    }
}

impl IntNode {
    pub fn value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }
}

impl FloatNode {
    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl StrNode {
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub fn min_len(mut self, min_len: u64) -> Self {
        self.min_len = Some(min_len);
        self
    }

    pub fn max_len(mut self, max_len: u64) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = Some(alphabet.into());
        self
    }

    pub fn substr(mut self, substr: impl Into<String>) -> Self {
        self.substr = Some(substr.into());
        self
    }
}

impl ListNode {
    pub fn of(element: Node) -> Self {
        Self {
            items: Some(ListItems::Homogeneous(Box::new(element))),
            ..Self::default()
        }
    }

    pub fn tuple(elements: Vec<Element>) -> Self {
        Self {
            items: Some(ListItems::Tuple(elements)),
            ..Self::default()
        }
    }

    pub fn len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub fn min_len(mut self, min_len: u64) -> Self {
        self.min_len = Some(min_len);
        self
    }

    pub fn max_len(mut self, max_len: u64) -> Self {
        self.max_len = Some(max_len);
        self
    }
}

impl DictNode {
    /// A dict with declared keys that rejects undeclared ones.
    pub fn closed() -> Self {
        Self {
            keys: Some(IndexMap::new()),
            allows_additional: false,
        }
    }

    /// A dict with declared keys that also accepts undeclared ones.
    pub fn open() -> Self {
        Self {
            keys: Some(IndexMap::new()),
            allows_additional: true,
        }
    }

    pub fn key(self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.insert(name.into(), node.into(), false)
    }

    pub fn optional_key(self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.insert(name.into(), node.into(), true)
    }

    fn insert(mut self, name: String, node: Node, optional: bool) -> Self {
        self.keys
            .get_or_insert_with(IndexMap::new)
            .insert(name, DictKey { node, optional });
        self
    }
}

impl From<BoolNode> for Node {
    fn from(node: BoolNode) -> Self {
        Node::Bool(node)
    }
}

impl From<IntNode> for Node {
    fn from(node: IntNode) -> Self {
        Node::Int(node)
    }
}

impl From<FloatNode> for Node {
    fn from(node: FloatNode) -> Self {
        Node::Float(node)
    }
}

impl From<StrNode> for Node {
    fn from(node: StrNode) -> Self {
        Node::Str(node)
    }
}

impl From<ListNode> for Node {
    fn from(node: ListNode) -> Self {
        Node::List(node)
    }
}

impl From<DictNode> for Node {
    fn from(node: DictNode) -> Self {
        Node::Dict(node)
    }
}

impl From<BytesNode> for Node {
    fn from(node: BytesNode) -> Self {
        Node::Bytes(node)
    }
}

// --- Text rendering ---

/// Writes `name(arg, arg, ...)` or just `name` when there are no args.
fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[String]) -> fmt::Result {
    if args.is_empty() {
        write!(f, "{}", name)
    } else {
        write!(f, "{}({})", name, args.join(", "))
    }
}

fn bounds<T: fmt::Display>(value: &Option<T>, min: &Option<T>, max: &Option<T>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(v) = value {
        args.push(v.to_string());
    }
    if let Some(v) = min {
        args.push(format!("min={}", v));
    }
    if let Some(v) = max {
        args.push(format!("max={}", v));
    }
    args
}

fn lengths(len: &Option<u64>, min_len: &Option<u64>, max_len: &Option<u64>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(v) = len {
        args.push(format!("len={}", v));
    }
    if let Some(v) = min_len {
        args.push(format!("min_len={}", v));
    }
    if let Some(v) = max_len {
        args.push(format!("max_len={}", v));
    }
    args
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => write!(f, "null"),
            Node::Bool(b) => {
                let args: Vec<String> = b.value.iter().map(|v| v.to_string()).collect();
                write_call(f, "bool", &args)
            }
            Node::Int(i) => write_call(f, "int", &bounds(&i.value, &i.min, &i.max)),
            Node::Float(x) => write_call(f, "float", &bounds(&x.value, &x.min, &x.max)),
            Node::Str(s) => {
                let mut args = Vec::new();
                if let Some(v) = &s.value {
                    args.push(format!("{:?}", v));
                }
                args.extend(lengths(&s.len, &s.min_len, &s.max_len));
                if let Some(p) = &s.pattern {
                    args.push(format!("pattern={:?}", p));
                }
                if let Some(a) = &s.alphabet {
                    args.push(format!("alphabet={:?}", a));
                }
                if let Some(sub) = &s.substr {
                    args.push(format!("substr={:?}", sub));
                }
                write_call(f, "str", &args)
            }
            Node::List(l) => {
                match &l.items {
                    None => write!(f, "list")?,
                    Some(ListItems::Homogeneous(element)) => write!(f, "list[{}]", element)?,
                    Some(ListItems::Tuple(elements)) => {
                        let parts: Vec<String> = elements
                            .iter()
                            .map(|e| match e {
                                Element::Node(n) => n.to_string(),
                                Element::Ellipsis => "...".to_string(),
                            })
                            .collect();
                        write!(f, "list({})", parts.join(", "))?;
                    }
                }
                let args = lengths(&l.len, &l.min_len, &l.max_len);
                if !args.is_empty() {
                    write!(f, ".len({})", args.join(", "))?;
                }
                Ok(())
            }
            Node::Dict(d) => {
                let Some(keys) = &d.keys else {
                    return write!(f, "dict");
                };
                let mut parts: Vec<String> = keys
                    .iter()
                    .map(|(name, key)| {
                        let marker = if key.optional { "?" } else { "" };
                        format!("{:?}{}: {}", name, marker, key.node)
                    })
                    .collect();
                if d.allows_additional {
                    parts.push("...".to_string());
                }
                write!(f, "dict{{{}}}", parts.join(", "))
            }
            Node::Union(variants) => {
                if variants.is_empty() {
                    return write!(f, "any");
                }
                let parts: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
                write!(f, "any({})", parts.join(" | "))
            }
            Node::Unordered(member) => write!(f, "unordered({})", member),
            Node::Bytes(_) => write!(f, "bytes"),
        }
    }
}
