//! Golden-file test harness for cjsify.
//!
//! Discovers `.input.js` files under `tests/fixtures/`, runs the cjsify
//! pipeline (parse → lower → rewrite), and compares output against the
//! corresponding `.expected.js` file.
//!
//! Set `CJ_UPDATE_FIXTURES=1` to overwrite expected files with actual output.

use std::path::{Path, PathBuf};

use anyhow::Result;
use cj_ast::{ModuleSyntax, Node};
use cj_parser::parse_module;
use cj_rewrite::Rewriter;

fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR is crates/cj_test/, so go up two levels to workspace root.
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
}

fn collect_input_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir(dir)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".input.js"))
        })
        .collect();
    files.sort();
    files
}

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut result = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                result.extend(walkdir(&path));
            } else {
                result.push(path);
            }
        }
    }
    result
}

fn run_pipeline(source: &str, filename: &str) -> Result<String> {
    let parsed = parse_module(source, filename, &ModuleSyntax::default())?;
    Ok(Rewriter::default().rewrite(&parsed.source, &parsed.program)?)
}

fn has_module_declarations(node: &Node) -> bool {
    match node {
        Node::Import(_) | Node::Export(_) | Node::Module(_) => true,
        Node::Syntax(_) => node.children().into_iter().any(has_module_declarations),
    }
}

#[test]
fn golden_file_tests() {
    let fixtures = fixtures_dir();
    let input_files: Vec<PathBuf> = collect_input_files(&fixtures)
        .into_iter()
        .filter(|p| !p.starts_with(fixtures.join("roundtrip")))
        .collect();

    assert!(
        !input_files.is_empty(),
        "No test fixtures found in {}",
        fixtures.display()
    );

    let update_mode = std::env::var("CJ_UPDATE_FIXTURES").is_ok();
    let mut failures = Vec::new();

    for input_path in &input_files {
        let expected_path = PathBuf::from(
            input_path
                .to_string_lossy()
                .replace(".input.js", ".expected.js"),
        );

        let test_name = input_path
            .strip_prefix(&fixtures)
            .unwrap()
            .display()
            .to_string();

        let source = match std::fs::read_to_string(input_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: failed to read input: {e}"));
                continue;
            }
        };

        let filename = input_path.display().to_string();
        let actual = match run_pipeline(&source, &filename) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: pipeline failed: {e:#}"));
                continue;
            }
        };

        if update_mode {
            if let Err(e) = std::fs::write(&expected_path, &actual) {
                failures.push(format!("{test_name}: failed to write expected: {e}"));
            }
            continue;
        }

        let expected = match std::fs::read_to_string(&expected_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!(
                    "{test_name}: failed to read expected {}: {e}",
                    expected_path.display()
                ));
                continue;
            }
        };
        if actual.trim() != expected.trim() {
            failures.push(format!(
                "{test_name}: output mismatch\n{}",
                pretty_assertions::StrComparison::new(expected.trim(), actual.trim())
            ));
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} golden test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

#[test]
fn roundtrip_tests() {
    let fixtures = fixtures_dir().join("roundtrip");
    let input_files = collect_input_files(&fixtures);

    assert!(
        !input_files.is_empty(),
        "No roundtrip fixtures found in {}",
        fixtures.display()
    );

    let mut failures = Vec::new();

    for input_path in &input_files {
        let test_name = input_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();

        let source = match std::fs::read_to_string(input_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: failed to read: {e}"));
                continue;
            }
        };

        let filename = input_path.display().to_string();
        let output = match run_pipeline(&source, &filename) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: pipeline failed: {e:#}"));
                continue;
            }
        };

        // The output must parse again, with the legacy forms disabled, and
        // contain no module declarations at all.
        let plain = ModuleSyntax {
            module_from: false,
            bare_default_export: false,
        };
        match parse_module(&output, &format!("{test_name}.output.js"), &plain) {
            Ok(reparsed) if has_module_declarations(&reparsed.program) => failures.push(format!(
                "{test_name}: output still has module declarations\n--- output ---\n{}",
                output.trim()
            )),
            Ok(_) => {}
            Err(e) => failures.push(format!(
                "{test_name}: output is not valid JavaScript: {e:#}\n--- output ---\n{}",
                output.trim()
            )),
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} roundtrip test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

#[test]
fn rewriting_twice_gives_identical_temporaries() {
    let source = "import { a } from 'a';\nexport * from 'b';\n";
    let first = run_pipeline(source, "twice.js").unwrap();
    let second = run_pipeline(source, "twice.js").unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("var mod$0 = require('a');"));
}
