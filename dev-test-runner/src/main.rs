//! Fixture runner: inject every `fixtures/<case>/input.json` against its
//! `schema.json` and compare the rendered trees with `expected.txt`.
//!
//! `cargo run -p dev-test-runner [-- <fixtures-dir>]`
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::{Context, Result};
use colored::Colorize;

fn run_case(dir: &Path) -> Result<Option<String>> {
    let objects = json_inject::inject_file(dir.join("input.json"), dir.join("schema.json"))?;
    let expected_path = dir.join("expected.txt");
    let expected = std::fs::read_to_string(&expected_path)
        .with_context(|| format!("failed to read {}", expected_path.display()))?;

    let actual: String = objects.iter().map(|o| o.to_string()).collect();

    if actual == expected {
        Ok(None)
    } else {
        Ok(Some(actual))
    }
}

fn main() -> Result<ExitCode> {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"));

    let pattern = format!("{}/*/schema.json", glob::Pattern::escape(&root.to_string_lossy()));
    let mut failed = 0usize;
    let mut cases = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("invalid fixture pattern {pattern}"))? {
        match entry {
            Ok(schema_path) => {
                if let Some(dir) = schema_path.parent() {
                    cases.push(dir.to_path_buf());
                }
            }
            Err(error) => {
                failed += 1;
                eprintln!("{} {}: {error}", "❌".red(), error.path().display());
            }
        }
    }
    cases.sort();

    for case in &cases {
        let name = case.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        match run_case(case) {
            Ok(None) => eprintln!("{} {name}", "✅".green()),
            Ok(Some(actual)) => {
                failed += 1;
                eprintln!("{} {name}: output differs from expected.txt", "❌".red());
                eprintln!("—— actual ——\n{actual}");
            }
            Err(error) => {
                failed += 1;
                eprintln!("{} {name}: {error:#}", "❌".red());
            }
        }
    }

    if cases.is_empty() {
        failed += 1;
        eprintln!("{} no fixtures matched {pattern}", "❌".red());
    }
    eprintln!("{} case(s), {} failed", cases.len(), failed);
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
