#![allow(dead_code)]
use std::fs;
use std::path::Path;

use mercu::ast::Program;
use mercu::parser;
use test_support::{CaseClass, load_cases};

/// `(label, program path)` for every successful case with benchmarking enabled.
pub fn workloads() -> Vec<(String, String)> {
    let cases = load_cases(Path::new("tests/programs")).expect("load cases");
    cases
        .into_iter()
        .filter(|case| case.spec.class == CaseClass::RuntimeSuccess && case.spec.bench.enabled)
        .map(|case| {
            let label = case
                .spec
                .bench
                .tags
                .first()
                .cloned()
                .unwrap_or_else(|| case.name.clone());
            (label, case.program_path.display().to_string())
        })
        .collect()
}

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_program(path: &str) -> Program {
    let source = load_source(path);
    parser::parse(&source).unwrap_or_else(|err| panic!("parse {path}: {err}"))
}
