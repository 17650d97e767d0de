//! Endpoint collection from OpenAPI documents.
//!
//! The document is normalized once at the root. Every operation under
//! `paths` then yields one [`Endpoint`] per numeric response status, with
//! its request, response, query and header schemas located and imported.

use heck::{ToSnakeCase, ToUpperCamelCase};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::CollectError;
use crate::model::Node;
use crate::types::{json_type_name, Translator};

const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Swagger 2 parameters describe their schema inline.
const INLINE_SCHEMA_KEYS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
];

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("valid placeholder regex"));

/// One operation and response status, with its schemas in raw and imported form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub http_method: String,
    /// Path as declared, with enum path parameters substituted.
    pub path: String,
    /// `path` with placeholders in snake_case.
    pub converted_path: String,
    /// Path parameters in snake_case, then `body` when the operation takes one.
    pub args: Vec<String>,
    pub status: u16,
    pub tags: Vec<String>,
    /// UpperCamelCase method and path words, e.g. `GetUsersUserId`.
    pub schema_prefix: String,
    /// snake_case method and path words, e.g. `get_users_user_id`.
    pub interface_method: String,
    pub request_schema: Value,
    pub request: Node,
    pub response_schema: Value,
    pub response: Node,
    pub queries_schema: Value,
    pub queries: Node,
    pub headers_schema: Value,
    pub headers: Node,
}

/// Schemas shared by every status of one operation.
struct Operation<'a> {
    method: &'a str,
    path: &'a str,
    tags: Vec<String>,
    has_body: bool,
    request_schema: Value,
    queries_schema: Value,
    headers_schema: Value,
    /// Path parameters with an `enum`, and their literals.
    enum_params: Vec<(&'a str, Vec<String>)>,
}

pub(crate) fn collect(
    document: &Value,
    translator: &Translator,
) -> Result<Vec<Endpoint>, CollectError> {
    let normalized = translator.normalize(document)?;

    let paths = match normalized.get("paths") {
        None => return Ok(Vec::new()),
        Some(Value::Object(paths)) => paths,
        Some(other) => {
            return Err(CollectError::InvalidPaths {
                actual: json_type_name(other).to_string(),
            })
        }
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let Value::Object(item) = item else {
            return Err(CollectError::InvalidOperation {
                path: path.clone(),
                message: format!("expected path item object, got {}", json_type_name(item)),
            });
        };

        for (method, operation) in item {
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let Value::Object(operation) = operation else {
                return Err(CollectError::InvalidOperation {
                    path: path.clone(),
                    message: format!(
                        "{} operation: expected object, got {}",
                        method,
                        json_type_name(operation)
                    ),
                });
            };

            let parameters = merge_parameters(item, operation);
            let op = describe_operation(method, path, operation, &parameters);
            collect_operation(&op, operation, translator, &mut endpoints);
        }
    }

    tracing::debug!(count = endpoints.len(), "collected endpoints");
    Ok(endpoints)
}

/// Path-level parameters, overridden by operation-level ones on `(name, in)`.
fn merge_parameters<'a>(
    item: &'a Map<String, Value>,
    operation: &'a Map<String, Value>,
) -> Vec<&'a Map<String, Value>> {
    let mut merged: Vec<&Map<String, Value>> = Vec::new();
    let declared = |holder: &'a Map<String, Value>| {
        holder
            .get("parameters")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    };

    for param in declared(item).chain(declared(operation)) {
        let id = param_id(param);
        match merged.iter().position(|p| param_id(p) == id) {
            Some(index) => merged[index] = param,
            None => merged.push(param),
        }
    }
    merged
}

fn param_id(param: &Map<String, Value>) -> (Option<&str>, Option<&str>) {
    (
        param.get("name").and_then(Value::as_str),
        param.get("in").and_then(Value::as_str),
    )
}

fn located<'a, 'p>(
    parameters: &'p [&'a Map<String, Value>],
    location: &'p str,
) -> impl Iterator<Item = &'a Map<String, Value>> + 'p {
    parameters
        .iter()
        .copied()
        .filter(move |p| p.get("in").and_then(Value::as_str) == Some(location))
}

fn describe_operation<'a>(
    method: &'a str,
    path: &'a str,
    operation: &Map<String, Value>,
    parameters: &[&'a Map<String, Value>],
) -> Operation<'a> {
    let tags = operation
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let body_param = located(parameters, "body").next();
    let has_body = operation.contains_key("requestBody") || body_param.is_some();
    let request_schema = operation
        .get("requestBody")
        .and_then(content_schema)
        .or_else(|| body_param.and_then(|p| p.get("schema")).cloned())
        .unwrap_or_else(|| json!({}));

    let enum_params = located(parameters, "path")
        .filter_map(|param| {
            let name = param.get("name").and_then(Value::as_str)?;
            let literals = parameter_schema(param)
                .get("enum")
                .and_then(Value::as_array)?
                .iter()
                .map(|literal| match literal {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>();
            Some((name, literals))
        })
        .filter(|(name, _)| path.contains(&format!("{{{}}}", name)))
        .collect();

    Operation {
        method,
        path,
        tags,
        has_body,
        request_schema,
        queries_schema: parameters_object(parameters, "query"),
        headers_schema: parameters_object(parameters, "header"),
        enum_params,
    }
}

fn collect_operation(
    op: &Operation<'_>,
    operation: &Map<String, Value>,
    translator: &Translator,
    endpoints: &mut Vec<Endpoint>,
) {
    let Some(Value::Object(responses)) = operation.get("responses") else {
        tracing::debug!(method = op.method, path = op.path, "operation has no responses");
        return;
    };

    let request = translator.import(&op.request_schema);
    let queries = translator.import(&op.queries_schema);
    let headers = translator.import(&op.headers_schema);

    for (status, response) in responses {
        let Ok(code) = status.parse::<u16>() else {
            tracing::debug!(
                method = op.method,
                path = op.path,
                status = %status,
                "skipping non-numeric status"
            );
            continue;
        };

        let response_schema = content_schema(response)
            .or_else(|| response.get("schema").cloned())
            .unwrap_or_else(|| json!({}));
        let response_node = translator.import(&response_schema);

        for substitutions in enum_combinations(&op.enum_params) {
            let mut path = op.path.to_string();
            for (name, literal) in &substitutions {
                path = path.replace(&format!("{{{}}}", name), literal);
            }
            let (converted_path, mut args) = path_arguments(&path);
            if op.has_body {
                args.push("body".to_string());
            }
            let words = path_words(&path);

            tracing::debug!(method = op.method, path = %path, status = code, "collected endpoint");
            endpoints.push(Endpoint {
                http_method: op.method.to_string(),
                converted_path,
                args,
                status: code,
                tags: op.tags.clone(),
                schema_prefix: format!("{} {}", op.method, words).to_upper_camel_case(),
                interface_method: format!("{} {}", op.method, words).to_snake_case(),
                request_schema: op.request_schema.clone(),
                request: request.clone(),
                response_schema: response_schema.clone(),
                response: response_node.clone(),
                queries_schema: op.queries_schema.clone(),
                queries: queries.clone(),
                headers_schema: op.headers_schema.clone(),
                headers: headers.clone(),
                path,
            });
        }
    }
}

/// `content` lookup: `application/json`, else the first `*+json` media type.
fn content_schema(holder: &Value) -> Option<Value> {
    let content = holder.get("content")?.as_object()?;
    let media = content.get("application/json").or_else(|| {
        content
            .iter()
            .find(|(media_type, _)| media_type.ends_with("+json"))
            .map(|(_, media)| media)
    })?;
    media.get("schema").cloned()
}

/// A parameter's `schema`, or its Swagger 2 inline description.
fn parameter_schema(param: &Map<String, Value>) -> Value {
    if let Some(schema) = param.get("schema") {
        return schema.clone();
    }
    let inline: Map<String, Value> = INLINE_SCHEMA_KEYS
        .iter()
        .filter_map(|key| param.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect();
    Value::Object(inline)
}

/// Object schema assembled from the parameters at `location`.
fn parameters_object(parameters: &[&Map<String, Value>], location: &str) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in located(parameters, location) {
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            continue;
        };
        properties.insert(name.to_string(), parameter_schema(param));
        if param.get("required").and_then(Value::as_bool) == Some(true) {
            required.push(Value::String(name.to_string()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), "object".into());
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    Value::Object(schema)
}

/// Every choice of one literal per enum parameter. No enum parameters
/// gives a single empty choice.
fn enum_combinations<'a>(
    enum_params: &[(&'a str, Vec<String>)],
) -> Vec<Vec<(&'a str, String)>> {
    let mut combos: Vec<Vec<(&str, String)>> = vec![Vec::new()];
    for (name, literals) in enum_params {
        combos = combos
            .into_iter()
            .flat_map(move |combo| {
                literals.iter().map(move |literal| {
                    let mut next = combo.clone();
                    next.push((*name, literal.clone()));
                    next
                })
            })
            .collect();
    }
    combos
}

/// Snake-cased placeholders, as a rewritten path and as argument names.
fn path_arguments(path: &str) -> (String, Vec<String>) {
    let converted = PLACEHOLDER
        .replace_all(path, |caps: &Captures| format!("{{{}}}", caps[1].to_snake_case()))
        .into_owned();
    let args = PLACEHOLDER
        .captures_iter(path)
        .map(|caps| caps[1].to_snake_case())
        .collect();
    (converted, args)
}

fn path_words(path: &str) -> String {
    path.split('/')
        .map(|word| word.replace(['{', '}'], ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
