//! Shape Schema CLI
//!
//! Command-line interface for normalizing, importing and exporting schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use shape_schema::{
    load_document, load_document_auto, navigate_fragment, CollectingSink, ExportOptions, Node,
    TranslateError, Translator,
};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "shape-schema")]
#[command(about = "Translate between OpenAPI/JSON Schema and a structural schema model")]
#[command(version)]
struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print warnings as a JSON array on stderr instead of logging them
    #[arg(long, global = true)]
    warnings_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inline every $ref of a document
    Normalize {
        /// Document source: file path or URL (http:// or https://)
        source: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Import a (sub-)schema into the model
    Import {
        /// Document source: file path or URL (http:// or https://)
        source: String,

        /// JSON Pointer to the schema inside the document (default: root)
        #[arg(long, short)]
        pointer: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Export a model document as JSON Schema
    Export {
        /// Model file, as written by `import --format json`
        model: PathBuf,

        /// Root title of the exported schema
        #[arg(long)]
        title: Option<String>,

        /// Omit the $schema draft header
        #[arg(long)]
        hide_draft: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Import then export a (sub-)schema
    Roundtrip {
        /// Document source: file path or URL (http:// or https://)
        source: String,

        /// JSON Pointer to the schema inside the document (default: root)
        #[arg(long, short)]
        pointer: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Summarize the endpoint schemas of an OpenAPI document
    Collect {
        /// Document source: file path or URL (http:// or https://)
        source: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries only JSON; logs go to stderr
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let sink = Arc::new(CollectingSink::new());
    let translator = if cli.warnings_json {
        Translator::with_sink(sink.clone())
    } else {
        Translator::new()
    };

    let result = match cli.command {
        Commands::Normalize {
            source,
            output,
            pretty,
        } => run_normalize(&translator, &source, output.as_deref(), pretty),

        Commands::Import {
            source,
            pointer,
            format,
            output,
        } => run_import(
            &translator,
            &source,
            pointer.as_deref(),
            format,
            output.as_deref(),
        ),

        Commands::Export {
            model,
            title,
            hide_draft,
            output,
            pretty,
        } => {
            let mut options = ExportOptions::new().hide_draft_header(hide_draft);
            options.title = title;
            run_export(&translator, &model, &options, output.as_deref(), pretty)
        }

        Commands::Roundtrip {
            source,
            pointer,
            pretty,
        } => run_roundtrip(&translator, &source, pointer.as_deref(), pretty),

        Commands::Collect { source, pretty } => run_collect(&translator, &source, pretty),
    };

    if cli.warnings_json {
        eprintln!("{}", Value::from(sink.take()));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_normalize(
    translator: &Translator,
    source: &str,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), u8> {
    let document = load_normalized(translator, source)?;
    write_output(&render_json(&document, pretty)?, output)
}

fn run_import(
    translator: &Translator,
    source: &str,
    pointer: Option<&str>,
    format: Format,
    output: Option<&Path>,
) -> Result<(), u8> {
    let node = import_at(translator, source, pointer)?;

    let rendered = match format {
        Format::Text => node.to_string(),
        Format::Json => {
            let value = serde_json::to_value(&node).map_err(|e| {
                eprintln!("Error serializing model: {}", e);
                2u8
            })?;
            render_json(&value, true)?
        }
    };
    write_output(&rendered, output)
}

fn run_export(
    translator: &Translator,
    model_path: &Path,
    options: &ExportOptions,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), u8> {
    let document = load_document(model_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let node: Node = serde_json::from_value(document).map_err(|source| {
        let e = TranslateError::InvalidModel { source };
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let schema = translator.export(&node, options);
    write_output(&render_json(&schema, pretty)?, output)
}

fn run_roundtrip(
    translator: &Translator,
    source: &str,
    pointer: Option<&str>,
    pretty: bool,
) -> Result<(), u8> {
    let node = import_at(translator, source, pointer)?;
    let schema = translator.export(&node, &ExportOptions::new().hide_draft_header(true));
    println!("{}", render_json(&schema, pretty)?);
    Ok(())
}

fn run_collect(translator: &Translator, source: &str, pretty: bool) -> Result<(), u8> {
    let document = load_document_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let endpoints = translator.collect(&document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let summary: Vec<Value> = endpoints
        .iter()
        .map(|endpoint| {
            json!({
                "http_method": endpoint.http_method,
                "path": endpoint.path,
                "converted_path": endpoint.converted_path,
                "status": endpoint.status,
                "args": endpoint.args,
                "tags": endpoint.tags,
                "schema_prefix": endpoint.schema_prefix,
                "interface_method": endpoint.interface_method,
                "request": endpoint.request.to_string(),
                "response": endpoint.response.to_string(),
                "queries": endpoint.queries.to_string(),
                "headers": endpoint.headers.to_string(),
            })
        })
        .collect();

    println!("{}", render_json(&Value::Array(summary), pretty)?);
    Ok(())
}

fn load_normalized(translator: &Translator, source: &str) -> Result<Value, u8> {
    let document = load_document_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    translator.normalize(&document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn import_at(translator: &Translator, source: &str, pointer: Option<&str>) -> Result<Node, u8> {
    let document = load_normalized(translator, source)?;
    let schema = match pointer {
        Some(pointer) => navigate_fragment(&document, pointer).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        None => document,
    };
    Ok(translator.import(&schema))
}

fn render_json(value: &Value, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn write_output(content: &str, output: Option<&Path>) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(path, content).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
