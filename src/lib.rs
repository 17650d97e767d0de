//! Shape Schema
//!
//! Bidirectional translation between OpenAPI / JSON Schema documents and a
//! structural schema model.
//!
//! A document is first normalized (every `$ref` inlined against the document
//! itself), then any sub-schema can be imported into a [`Node`]. Nodes export
//! back to JSON Schema draft 2020-12.
//!
//! # Example
//!
//! ```
//! use shape_schema::{export_node, import_node, normalize, DictNode, ExportOptions, IntNode, Node};
//! use serde_json::json;
//!
//! let document = json!({
//!     "$defs": { "Id": { "type": "integer", "minimum": 1 } },
//!     "type": "object",
//!     "properties": { "id": { "$ref": "#/$defs/Id" } },
//!     "required": ["id"]
//! });
//!
//! let normalized = normalize(&document).unwrap();
//! let node = import_node(&normalized);
//!
//! assert_eq!(
//!     node,
//!     Node::Dict(DictNode::open().key("id", IntNode::default().min(1)))
//! );
//!
//! let schema = export_node(&node, &ExportOptions::new().hide_draft_header(true));
//! assert_eq!(schema["properties"]["id"], json!({ "type": "integer", "minimum": 1 }));
//! ```
//!
//! # Warnings
//!
//! Cycles, unknown `type` strings and unsupported model properties do not
//! fail a translation. They go to the [`WarningSink`] held by the
//! [`Translator`]; the default sink logs through `tracing`.
//!
//! | Construct | Import | Export |
//! |-----------|--------|--------|
//! | cyclic `$ref` | cut to `{}` during normalization | n/a |
//! | unknown `type` | any | n/a |
//! | unsupported prop | n/a | ignored |
//! | `Bytes` | imported as `str` | `{}` |

mod collector;
mod error;
mod exporter;
mod importer;
mod loader;
mod model;
mod normalizer;
mod types;
mod warning;

pub use collector::Endpoint;
pub use error::{CollectError, LoadError, TranslateError};
pub use loader::{is_url, load_document, load_document_auto, load_document_str, navigate_fragment};
pub use model::{
    supported, BoolNode, BytesNode, DictKey, DictNode, Element, FloatNode, IntNode, ListItems,
    ListNode, Node, StrNode,
};
pub use normalizer::Normalized;
pub use types::{
    export_node, import_node, json_type_name, normalize, ExportOptions, Translator, DRAFT_2020_12,
};
pub use warning::{CollectingSink, TracingSink, WarningSink};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
