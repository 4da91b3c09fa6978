//! Minimal CLI: schema + JSON → (object trees | schema listing)
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, Args, ArgAction};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use crate::inject::{parse_document, read_source, InjectOptions, Injector, DEFAULT_MAX_DEPTH, ROOT_CLASS};
use crate::model::Instance;
use crate::schema::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// inject JSON documents into typed object trees described by a schema
#[derive(Parser, Debug)]
#[command(name = "json-inject", version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// inject inputs and print the resulting object trees
    Inject(InjectOut),
    /// print the classes and fields of a schema
    Classes(ClassesOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct InjectOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// class instantiated for each top-level object
    #[arg(long, default_value = ROOT_CLASS)]
    root_class: String,

    /// objects nested deeper than this are dropped
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ClassesOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

/// Documents loaded from one input file.
struct Source {
    path: PathBuf,
    documents: Vec<Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<Schema> {
        Schema::load(&self.schema)
            .with_context(|| format!("failed to load schema {}", self.schema.display()))
    }
}

impl InputSettings {
    /// Resolve, read and pre-process every input; files load in parallel.
    fn load_all(&self) -> Result<Vec<Source>> {
        if let Some(jq_expr) = self.jq_expr.as_ref() {
            crate::jq_exec::check(jq_expr).context("invalid --jq-expr")?;
        }
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        source_paths
            .into_par_iter()
            .map(|path| {
                let documents = self.load_file(&path)?;
                Ok(Source { path, documents })
            })
            .collect()
    }

    fn load_file(&self, source_path: &Path) -> Result<Vec<Value>> {
        let source = read_source(source_path)?;
        let parsed = parse_documents(&source, self.ndjson)
            .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?;
        let mut out = Vec::new();
        for json_value in parsed {
            let selected = self.select(json_value)
                .with_context(|| format!("failed to pre-process {}", source_path.display()))?;
            out.extend(selected);
        }
        tracing::debug!(path = %source_path.display(), documents = out.len(), "loaded input");
        Ok(out)
    }

    /// Apply `--json-pointer`, then `--jq-expr`.
    fn select(&self, json_value: Value) -> Result<Vec<Value>> {
        let json_value = match self.json_pointer.as_deref() {
            None => json_value,
            Some(ptr) => match json_value.pointer(ptr) {
                Some(node) => node.clone(),
                None => {
                    tracing::warn!(pointer = ptr, "JSON pointer matched nothing; document skipped");
                    return Ok(Vec::new());
                }
            },
        };
        match self.jq_expr.as_ref() {
            None => Ok(vec![json_value]),
            Some(jq_expr) => crate::jq_exec::run(jq_expr, &json_value),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Default log filter for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Classes(target) => {
                let schema = target.schema_settings.load()?;
                print!("{schema}");
                Ok(())
            }
            Command::Inject(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                // 1) schema + inputs
                let schema = target.schema_settings.load()?;
                let sources = target.input_settings.load_all()?;

                // 2) inject, one shared schema across files
                let options = InjectOptions {
                    root_class: target.root_class.clone(),
                    max_depth: target.max_depth,
                };
                let injector = Injector::with_options(&schema, options);
                let results: Vec<(&Source, Vec<Instance>)> = sources
                    .par_iter()
                    .map(|src| {
                        let objects = src.documents.iter().flat_map(|d| injector.inject(d)).collect();
                        (src, objects)
                    })
                    .collect();

                // 3) render
                let mut rendered = String::new();
                for (src, objects) in &results {
                    writeln!(rendered, "# {}", src.path.display())?;
                    for object in objects {
                        rendered.push_str(&object.to_string());
                    }
                    report(src, objects.len());
                }

                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &rendered)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    print!("{rendered}");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(src: &Source, objects: usize) {
    let path = src.path.display();
    let docs = src.documents.len();
    if objects == 0 {
        eprintln!("{} {path}: {docs} document(s), no objects", "!".yellow().bold());
    } else {
        eprintln!("{} {path}: {docs} document(s), {objects} object(s)", "✔".green().bold());
    }
}

/// Whole-file JSON, or one document per non-blank line for NDJSON.
fn parse_documents(source: &str, ndjson: bool) -> Result<Vec<Value>> {
    if !ndjson {
        return Ok(vec![parse_document(source)?]);
    }
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            parse_document(line).with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
