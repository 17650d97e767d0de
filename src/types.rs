//! Configuration for translation: the shared `Translator` and export options.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::collector::{self, Endpoint};
use crate::error::{CollectError, TranslateError};
use crate::exporter;
use crate::importer;
use crate::model::Node;
use crate::normalizer::{self, Normalized};
use crate::warning::{TracingSink, WarningSink};

/// JSON Schema draft identifier written at the root of exported documents.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema#";

/// Returns the JSON type name for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Document-level options for export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Injected once as the root `title`.
    pub title: Option<String>,
    /// Suppresses the root `$schema` annotation.
    pub hide_draft_header: bool,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn hide_draft_header(mut self, hide: bool) -> Self {
        self.hide_draft_header = hide;
        self
    }
}

/// Entry point for normalization, import and export.
///
/// Holds the warning sink every operation reports to. Translators carry no
/// other state, so one instance can serve many threads.
#[derive(Clone)]
pub struct Translator {
    sink: Arc<dyn WarningSink>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator").finish_non_exhaustive()
    }
}

impl Translator {
    /// Translator that logs warnings through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn WarningSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn warn(&self, message: &str) {
        self.sink.warn(message);
    }

    /// Inline every `$ref` in `document` against the document itself.
    ///
    /// # Errors
    ///
    /// Returns `TranslateError` if a reference does not resolve.
    pub fn normalize(&self, document: &Value) -> Result<Value, TranslateError> {
        self.normalize_report(document).map(|n| n.document)
    }

    /// Like [`Translator::normalize`], also returning the cyclic pointers found.
    pub fn normalize_report(&self, document: &Value) -> Result<Normalized, TranslateError> {
        normalizer::normalize(document, self)
    }

    /// Import a normalized JSON Schema node into the model.
    pub fn import(&self, node: &Value) -> Node {
        importer::import_node(node, self)
    }

    /// Export a model node as a JSON Schema document.
    pub fn export(&self, node: &Node, options: &ExportOptions) -> Value {
        exporter::export_document(node, options, self)
    }

    /// Collect per-endpoint schemas from an OpenAPI document.
    ///
    /// # Errors
    ///
    /// Returns `CollectError` on unresolved references or malformed `paths`.
    pub fn collect(&self, document: &Value) -> Result<Vec<Endpoint>, CollectError> {
        collector::collect(document, self)
    }
}

/// Normalize with a default translator.
///
/// # Errors
///
/// Returns `TranslateError` if a reference does not resolve.
pub fn normalize(document: &Value) -> Result<Value, TranslateError> {
    Translator::new().normalize(document)
}

/// Import with a default translator.
pub fn import_node(node: &Value) -> Node {
    Translator::new().import(node)
}

/// Export with a default translator.
pub fn export_node(node: &Node, options: &ExportOptions) -> Value {
    Translator::new().export(node, options)
}
