//! Minimal CLI: get | coerce
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use typeparse::{Schema, TypeParse, path, types as t};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// pull values out of JSON documents by path and coerce them to a target kind
#[derive(Parser, Debug)]
#[command(name = "typeparse", version)]
pub struct CommandLineInterface {
    /// log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG applies otherwise
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the raw value found at a path
    Get(GetOut),
    /// parse every document with a single-node schema
    Coerce(CoerceOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GetOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// dotted path, e.g. `user.phones.[-1]` (empty = whole document)
    #[arg(long, default_value = "")]
    path: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Number,
    Boolean,
    Any,
}

#[derive(clap::Parser, Debug)]
struct CoerceOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// target kind
    #[arg(long, value_enum)]
    kind: Kind,

    /// dotted path to read from (whole document if omitted)
    #[arg(long)]
    path: Option<String>,

    /// default value, as JSON (bare text is taken as a string)
    #[arg(long)]
    default: Option<String>,

    /// booleans: coerce by truthiness instead of accepting only true/false
    #[arg(long)]
    loose: bool,

    /// yield nothing instead of failing
    #[arg(long)]
    optional: bool,

    /// the path holds an array; coerce each element
    #[arg(long)]
    each: bool,

    /// print tagged {"success": ..} results and always exit 0
    #[arg(long)]
    safe: bool,
}

struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = serde_json::from_str::<Value>(line).with_context(|| {
                        format!("failed to parse JSON line ({source_path_str}:{})", line_no + 1)
                    })?;
                    documents.push(Document {
                        source: format!("{source_path_str}:{}", line_no + 1),
                        value,
                    });
                }
            } else {
                let value = serde_json::from_str::<Value>(&source).with_context(|| {
                    format!("failed to parse JSON source file ({source_path_str})")
                })?;
                documents.push(Document {
                    source: source_path_str,
                    value,
                });
            }
        }
        debug!(documents = documents.len(), "loaded inputs");
        Ok(documents)
    }
}

impl CoerceOut {
    fn schema(&self) -> Schema {
        let mut node = match self.kind {
            Kind::String => t::string(),
            Kind::Number => t::number(),
            Kind::Boolean => t::boolean().strict(!self.loose),
            Kind::Any => t::any(),
        };
        if let Some(default) = &self.default {
            node = node.default_value(parse_default(default));
        }
        let mut schema = if self.each { t::array(node) } else { node };
        if let Some(path) = &self.path {
            schema = schema.path(path.as_str());
        }
        if self.optional {
            schema.optional()
        } else {
            schema
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) {
        let filter = match self.verbose {
            0 => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Returns `Ok(false)` when any document failed to parse.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Get(target) => {
                for document in target.input_settings.load()? {
                    match path::resolve(&document.value, &target.path) {
                        Some(value) => {
                            let value = serde_json::to_string(value)?;
                            println!("{}: {}", document.source, value)
                        }
                        None => println!("{}: {}", document.source, "<absent>".dimmed()),
                    }
                }
                Ok(true)
            }
            Command::Coerce(target) => {
                let documents = target.input_settings.load()?;
                let parser = TypeParse::new(target.schema());
                debug!(schema = ?parser.schema(), "built schema");

                if target.safe {
                    let results: Vec<_> = documents
                        .par_iter()
                        .map(|document| parser.safe_parse(&document.value))
                        .collect();
                    for (document, result) in documents.iter().zip(results) {
                        println!("{}: {}", document.source, serde_json::to_string(&result)?);
                    }
                    return Ok(true);
                }

                let results: Vec<_> = documents
                    .par_iter()
                    .map(|document| parser.parse(&document.value))
                    .collect();
                let mut all_ok = true;
                for (document, result) in documents.iter().zip(results) {
                    let source = &document.source;
                    match result {
                        Ok(Some(value)) => {
                            let value = serde_json::to_string(&value)?;
                            println!("{} {}: {}", "✓".green(), source, value)
                        }
                        Ok(None) => {
                            println!("{} {}: {}", "✓".green(), source, "<undefined>".dimmed())
                        }
                        Err(error) => {
                            all_ok = false;
                            println!("{} {}: {}", "✗".red(), source, error.to_string().red());
                        }
                    }
                }
                Ok(all_ok)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_default(text: &str) -> Value {
    serde_json::from_str(text)
        .unwrap_or_else(|_| Value::String(text.to_string()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
